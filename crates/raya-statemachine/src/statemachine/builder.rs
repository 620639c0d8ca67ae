//! Synthetic Type Builder
//!
//! Assembles the state machine type: generic parameters, fields, the
//! constructor, the driver method and ensure-methods. Nothing is visible in
//! the compilation until [`SyntheticTypeBuilder::finish`] registers the type.

use rustc_hash::FxHashSet;
use tracing::debug;

use super::generic_map::GenericMap;
use super::StateMachineKind;
use crate::ast::{Block, Expr, ExprKind, MethodRef, Stmt, StmtKind, TypeRef};
use crate::compilation::Compilation;
use crate::config::StateMachineOptions;
use crate::entity::{
    FieldDef, FieldId, GenericParamId, LocalId, MethodDef, MethodId, MethodKind, ParamDef, ParamId,
    TypeDef, TypeDefId, Visibility,
};
use crate::ty::Ty;

/// Where the value of a constructor argument comes from at the call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorArg {
    /// A parameter of the source method
    Param(ParamId),
    /// The enclosing instance (`self` at the call site)
    EnclosingSelf,
}

/// Supertype and capabilities chosen by a [`StateMachineKind`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    pub base: Option<Ty>,
    pub interfaces: Vec<Ty>,
}

/// The registered state machine type and its key members
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticType {
    pub id: TypeDefId,
    pub constructor: MethodId,
    pub driver: MethodId,
    pub state_field: FieldId,
    /// Back-reference to the enclosing instance, if `self`/`super` was used
    pub self_field: Option<FieldId>,
    pub ensure_methods: Vec<MethodId>,
}

/// Builder for the state machine type of one source method
#[derive(Debug)]
pub struct SyntheticTypeBuilder {
    id: TypeDefId,
    def: TypeDef,
    /// Instance type of the synthetic type over its own generic parameters
    self_ty: Ty,
    /// Generic context of the call site (declaring type's then method's)
    source_generics: Vec<GenericParamId>,
    /// Instance type of the source method's declaring type
    enclosing_ty: Ty,
    state_field: FieldId,
    self_field: Option<FieldId>,
    constructor: MethodId,
    ctor_params: Vec<ParamId>,
    ctor_body: Block,
    ctor_args: Vec<ConstructorArg>,
    driver: MethodId,
    driver_locals: Vec<LocalId>,
    ensure_methods: Vec<MethodId>,
    field_names: FxHashSet<String>,
}

impl SyntheticTypeBuilder {
    /// Allocate the synthetic type for `source`, clone its generic context and
    /// create the constructor and driver shells
    pub fn new(
        cx: &mut Compilation,
        source: MethodId,
        kind: &dyn StateMachineKind,
        options: &StateMachineOptions,
    ) -> (Self, GenericMap) {
        let method = cx.method(source);
        let span = method.span;
        let declaring = method.declaring_type;
        let base_name = kind.type_name(method, options);
        let mut source_generics = cx.type_def(declaring).generic_params.clone();
        let declaring_generics = source_generics.clone();
        source_generics.extend(method.generic_params.iter().copied());

        let id = cx.reserve_type();
        let name = cx.unique_name(&base_name);
        let map = GenericMap::build(cx, &source_generics, id);

        let mut def = TypeDef::new(name, span);
        def.generic_params = map.synthetic_params().to_vec();
        def.compiler_generated = true;

        let shared: &Compilation = cx;
        let caps = kind.configure(shared, shared.method(source), &map);
        let base = caps.base.clone().unwrap_or(Ty::Object);
        def.base = caps.base;
        def.interfaces = caps.interfaces;

        debug!(
            target: "statemachine",
            method = %cx.method(source).name,
            synthetic = %def.name,
            generics = def.generic_params.len(),
            "allocated state machine type"
        );

        let self_ty = Ty::constructed(id, map.synthetic_args());
        let enclosing_ty = Ty::constructed(
            declaring,
            declaring_generics.into_iter().map(Ty::GenericParam).collect(),
        );

        let mut ctor = MethodDef::new("constructor", id, Ty::Void, span);
        ctor.kind = MethodKind::Constructor;
        let constructor = cx.alloc_method(ctor);
        let ctor_body = Block::new(vec![Stmt::expr(Expr::synthetic(
            ExprKind::BaseConstructorCall { base },
        ))]);

        let driver = cx.alloc_method(MethodDef::new(
            options.driver_name.clone(),
            id,
            kind.driver_return_ty(),
            span,
        ));
        def.methods.push(driver);

        let state_name = cx.unique_name(&options.state_field_name);
        let state_field = cx.alloc_field(FieldDef {
            name: state_name.clone(),
            ty: Ty::Int,
            declaring_type: id,
            visibility: Visibility::Internal,
        });
        def.fields.push(state_field);
        let mut field_names = FxHashSet::default();
        field_names.insert(state_name);

        let builder = Self {
            id,
            def,
            self_ty,
            source_generics,
            enclosing_ty,
            state_field,
            self_field: None,
            constructor,
            ctor_params: Vec::new(),
            ctor_body,
            ctor_args: Vec::new(),
            driver,
            driver_locals: Vec::new(),
            ensure_methods: Vec::new(),
            field_names,
        };

        (builder, map)
    }

    pub fn id(&self) -> TypeDefId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Instance type of the synthetic type over its own generic parameters
    pub fn self_ty(&self) -> &Ty {
        &self.self_ty
    }

    /// Instance type of the source method's declaring type, in source generics
    pub fn enclosing_ty(&self) -> &Ty {
        &self.enclosing_ty
    }

    /// Whether the synthetic type declares generic parameters
    pub fn is_generic(&self) -> bool {
        self.def.is_generic()
    }

    pub fn state_field(&self) -> FieldId {
        self.state_field
    }

    pub fn self_field(&self) -> Option<FieldId> {
        self.self_field
    }

    pub fn driver(&self) -> MethodId {
        self.driver
    }

    pub fn driver_locals(&self) -> &[LocalId] {
        &self.driver_locals
    }

    /// Names of every field declared so far
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names.iter().map(String::as_str)
    }

    /// Declare a field on the synthetic type
    ///
    /// # Panics
    /// If a field with the same name already exists.
    pub fn add_field(&mut self, cx: &mut Compilation, name: String, ty: Ty) -> FieldId {
        assert!(
            self.field_names.insert(name.clone()),
            "duplicate field '{}' on state machine type '{}'",
            name,
            self.def.name
        );
        let field = cx.alloc_field(FieldDef {
            name,
            ty,
            declaring_type: self.id,
            visibility: Visibility::Internal,
        });
        self.def.fields.push(field);
        field
    }

    /// Declare a field initialized from a same-named constructor parameter
    pub fn add_constructor_field(
        &mut self,
        cx: &mut Compilation,
        param_name: &str,
        ty: Ty,
        arg: ConstructorArg,
    ) -> FieldId {
        let field_name = cx.unique_name(param_name);
        let field = self.add_field(cx, field_name, ty.clone());
        let param = cx.add_param(ParamDef {
            name: param_name.to_string(),
            ty,
            used: true,
        });
        self.ctor_params.push(param);
        self.ctor_body.push(Stmt::expr(Expr::assign(
            Expr::field(self.self_expr(), field),
            Expr::param(param),
        )));
        self.ctor_args.push(arg);
        field
    }

    /// The back-reference field, declared on first use
    pub fn back_reference(
        &mut self,
        cx: &mut Compilation,
        options: &StateMachineOptions,
        map: &GenericMap,
    ) -> FieldId {
        if let Some(field) = self.self_field {
            return field;
        }
        let ty = map.map_ty(&self.enclosing_ty);
        let field = self.add_constructor_field(cx, &options.self_field_name, ty, ConstructorArg::EnclosingSelf);
        debug!(target: "statemachine", synthetic = %self.def.name, "created back-reference field");
        self.self_field = Some(field);
        field
    }

    /// `self` of the synthetic type
    pub fn self_expr(&self) -> Expr {
        Expr::self_ref(self.self_ty.clone())
    }

    /// `self.state = state`
    pub fn set_state(&self, state: usize) -> Stmt {
        Stmt::expr(Expr::assign(
            Expr::field(self.self_expr(), self.state_field),
            Expr::int(state as i64),
        ))
    }

    /// Invoke a zero-argument method of the synthetic type on `self`
    pub fn call_on_self(&self, method: MethodId) -> Stmt {
        let method = if self.def.is_generic() {
            MethodRef::Mapped {
                source: method,
                declaring: self.self_ty.clone(),
            }
        } else {
            MethodRef::Def(method)
        };
        Stmt::expr(Expr::call(Expr::member(self.self_expr(), method), Vec::new()))
    }

    /// Add a private, zero-argument void method holding a region's cleanup
    pub fn add_ensure_method(&mut self, cx: &mut Compilation, name: String, body: Block) -> MethodId {
        let mut def = MethodDef::new(name, self.id, Ty::Void, self.def.span);
        def.visibility = Visibility::Private;
        def.body = body;
        let method = cx.alloc_method(def);
        self.def.methods.push(method);
        self.ensure_methods.push(method);
        method
    }

    /// Keep a local on the driver's own local list
    pub fn add_driver_local(&mut self, local: LocalId) {
        self.driver_locals.push(local);
    }

    /// Expression constructing the synthetic type at the source call site
    pub fn construction_expr(&self) -> Expr {
        let ty = Ty::constructed(
            self.id,
            self.source_generics.iter().map(|&p| Ty::GenericParam(p)).collect(),
        );
        let args = self
            .ctor_args
            .iter()
            .map(|arg| match arg {
                ConstructorArg::Param(param) => Expr::param(*param),
                ConstructorArg::EnclosingSelf => Expr::self_ref(self.enclosing_ty.clone()),
            })
            .collect();
        Expr::synthetic(ExprKind::New {
            ty: TypeRef::new(ty, self.def.span),
            args,
        })
    }

    /// Wire the constructor and driver, then register the type
    pub fn finish(mut self, cx: &mut Compilation, driver_body: Block) -> SyntheticType {
        {
            let ctor = cx.method_mut(self.constructor);
            ctor.params = std::mem::take(&mut self.ctor_params);
            ctor.body = std::mem::take(&mut self.ctor_body);
        }
        {
            let driver = cx.method_mut(self.driver);
            driver.body = driver_body;
            driver.locals = std::mem::take(&mut self.driver_locals);
        }
        self.def.constructors.push(self.constructor);

        debug!(
            target: "statemachine",
            synthetic = %self.def.name,
            fields = self.def.fields.len(),
            ensure_methods = self.ensure_methods.len(),
            "registered state machine type"
        );
        cx.register_generated_type(self.id, self.def);

        SyntheticType {
            id: self.id,
            constructor: self.constructor,
            driver: self.driver,
            state_field: self.state_field,
            self_field: self.self_field,
            ensure_methods: self.ensure_methods,
        }
    }
}

/// The state number assigned by `stmt`, if it is a state-field assignment
pub fn state_assignment(stmt: &Stmt, state_field: FieldId) -> Option<i64> {
    let StmtKind::Expr(expr) = &stmt.kind else {
        return None;
    };
    let ExprKind::Assign { target, value } = &expr.kind else {
        return None;
    };
    match (&target.kind, &value.kind) {
        (ExprKind::Field { field, .. }, ExprKind::Literal(crate::ast::Literal::Int(n))) if *field == state_field => {
            Some(*n)
        }
        _ => None,
    }
}
