//! Compilation-wide state
//!
//! Owns the entity arenas, the unique-name allocator and the diagnostic
//! channel. One [`Compilation`] is shared by every method lowered in it, so
//! lowering runs sequentially against it.

use crate::config::{validate_template, ConfigError};
use crate::entity::{
    FieldDef, FieldId, GenericOwner, GenericParamDef, GenericParamId, LocalDef, LocalId,
    MethodDef, MethodId, MethodKind, ParamDef, ParamId, TypeDef, TypeDefId,
};
use crate::error::StateMachineError;
use crate::ty::Ty;

/// Hands out names that cannot collide with user code or with each other
#[derive(Debug, Clone)]
pub struct UniqueNameAllocator {
    template: String,
    counter: u32,
}

impl UniqueNameAllocator {
    /// Create an allocator; `template` uses `{name}` and `{n}` placeholders
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            counter: 0,
        }
    }

    /// Allocate the next unique name derived from `base`
    pub fn next(&mut self, base: &str) -> String {
        self.counter += 1;
        self.template
            .replace("{name}", base)
            .replace("{n}", &self.counter.to_string())
    }

    /// Number of names handed out so far
    pub fn allocated(&self) -> u32 {
        self.counter
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Default for UniqueNameAllocator {
    fn default() -> Self {
        Self::new("${name}${n}")
    }
}

/// Entity arenas and shared services of one compilation
#[derive(Debug, Default)]
pub struct Compilation {
    /// `None` marks an id reserved by a builder that has not finished yet
    types: Vec<Option<TypeDef>>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    params: Vec<ParamDef>,
    locals: Vec<LocalDef>,
    generic_params: Vec<GenericParamDef>,
    names: UniqueNameAllocator,
    errors: Vec<StateMachineError>,
    /// Types synthesized by lowering passes, in registration order
    generated: Vec<TypeDefId>,
}

impl Compilation {
    /// Create an empty compilation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty compilation with a custom unique-name template
    ///
    /// Fails if the template lacks the `{name}` or `{n}` placeholder.
    pub fn with_name_template(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        validate_template(&template)?;
        Ok(Self {
            names: UniqueNameAllocator::new(template),
            ..Self::default()
        })
    }

    /// Template the unique-name allocator formats names with
    pub fn name_template(&self) -> &str {
        self.names.template()
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    /// Add a fully built type
    pub fn add_type(&mut self, def: TypeDef) -> TypeDefId {
        let id = TypeDefId::new(self.types.len() as u32);
        self.types.push(Some(def));
        id
    }

    /// Reserve an id for a type that is still being built
    pub fn reserve_type(&mut self) -> TypeDefId {
        let id = TypeDefId::new(self.types.len() as u32);
        self.types.push(None);
        id
    }

    /// Fill a reserved id with its finished definition
    pub fn define_type(&mut self, id: TypeDefId, def: TypeDef) {
        let slot = &mut self.types[id.index()];
        assert!(slot.is_none(), "type {} defined twice", id);
        *slot = Some(def);
    }

    /// Define a reserved type and record it as compiler generated
    pub fn register_generated_type(&mut self, id: TypeDefId, def: TypeDef) {
        self.define_type(id, def);
        self.generated.push(id);
    }

    /// Look up a defined type
    ///
    /// # Panics
    /// If `id` is reserved but not yet defined.
    pub fn type_def(&self, id: TypeDefId) -> &TypeDef {
        self.try_type_def(id)
            .unwrap_or_else(|| panic!("type {} is not defined", id))
    }

    pub fn try_type_def(&self, id: TypeDefId) -> Option<&TypeDef> {
        self.types.get(id.index()).and_then(Option::as_ref)
    }

    pub fn type_def_mut(&mut self, id: TypeDefId) -> &mut TypeDef {
        self.types[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("type {} is not defined", id))
    }

    /// Types registered by lowering passes
    pub fn generated_types(&self) -> &[TypeDefId] {
        &self.generated
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    /// Allocate a method without attaching it to its declaring type
    pub fn alloc_method(&mut self, def: MethodDef) -> MethodId {
        let id = MethodId::new(self.methods.len() as u32);
        self.methods.push(def);
        id
    }

    /// Allocate a method and attach it to its (defined) declaring type
    pub fn add_method(&mut self, def: MethodDef) -> MethodId {
        let owner = def.declaring_type;
        let kind = def.kind;
        let id = self.alloc_method(def);
        let owner = self.type_def_mut(owner);
        match kind {
            MethodKind::Method => owner.methods.push(id),
            MethodKind::Constructor => owner.constructors.push(id),
        }
        id
    }

    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDef {
        &mut self.methods[id.index()]
    }

    /// Allocate a field without attaching it to its declaring type
    pub fn alloc_field(&mut self, def: FieldDef) -> FieldId {
        let id = FieldId::new(self.fields.len() as u32);
        self.fields.push(def);
        id
    }

    /// Allocate a field and attach it to its (defined) declaring type
    pub fn add_field(&mut self, def: FieldDef) -> FieldId {
        let owner = def.declaring_type;
        let id = self.alloc_field(def);
        self.type_def_mut(owner).fields.push(id);
        id
    }

    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    pub fn add_param(&mut self, def: ParamDef) -> ParamId {
        let id = ParamId::new(self.params.len() as u32);
        self.params.push(def);
        id
    }

    pub fn param(&self, id: ParamId) -> &ParamDef {
        &self.params[id.index()]
    }

    pub fn add_local(&mut self, def: LocalDef) -> LocalId {
        let id = LocalId::new(self.locals.len() as u32);
        self.locals.push(def);
        id
    }

    pub fn local(&self, id: LocalId) -> &LocalDef {
        &self.locals[id.index()]
    }

    pub fn add_generic_param(&mut self, name: impl Into<String>, owner: GenericOwner) -> GenericParamId {
        let id = GenericParamId::new(self.generic_params.len() as u32);
        self.generic_params.push(GenericParamDef {
            name: name.into(),
            owner,
        });
        id
    }

    pub fn generic_param(&self, id: GenericParamId) -> &GenericParamDef {
        &self.generic_params[id.index()]
    }

    // ---------------------------------------------------------------------
    // Services
    // ---------------------------------------------------------------------

    /// Allocate a compilation-wide unique name derived from `base`
    pub fn unique_name(&mut self, base: &str) -> String {
        self.names.next(base)
    }

    /// Record an error on the diagnostic channel
    pub fn report(&mut self, error: StateMachineError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[StateMachineError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Render a type for messages and dumps
    pub fn display_ty(&self, ty: &Ty) -> String {
        match ty {
            Ty::Void => "void".to_string(),
            Ty::Bool => "bool".to_string(),
            Ty::Int => "int".to_string(),
            Ty::Str => "string".to_string(),
            Ty::Object => "object".to_string(),
            Ty::Named(def) => self.type_name(*def),
            Ty::Constructed { def, args } => {
                let args: Vec<String> = args.iter().map(|a| self.display_ty(a)).collect();
                format!("{}<{}>", self.type_name(*def), args.join(", "))
            }
            Ty::GenericParam(id) => self.generic_param(*id).name.clone(),
            Ty::Array(element) => format!("{}[]", self.display_ty(element)),
            Ty::Callable { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| self.display_ty(p)).collect();
                format!("({}) -> {}", params.join(", "), self.display_ty(ret))
            }
        }
    }

    fn type_name(&self, id: TypeDefId) -> String {
        match self.try_type_def(id) {
            Some(def) => def.name.clone(),
            None => format!("<{}>", id),
        }
    }
}
