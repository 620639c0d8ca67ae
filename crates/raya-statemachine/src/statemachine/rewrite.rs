//! Reference rewriting
//!
//! One pass over the source body that produces the driver body. Hoisted
//! variables become field accesses on `self`, `self`/`super` go through the
//! back-reference, types are rebound to the synthetic type's generic
//! parameters, suspension points claim their resume slots and protected
//! regions that straddle them are flattened on the way out.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::builder::SyntheticTypeBuilder;
use super::generic_map::GenericMap;
use super::hoist::FieldBindings;
use super::labels::LabelTable;
use super::try_region::RegionTree;
use crate::ast::{Block, CatchClause, Expr, ExprKind, MethodRef, Span, Stmt, StmtKind, TryStmt, TypeRef};
use crate::compilation::Compilation;
use crate::config::StateMachineOptions;
use crate::entity::{GenericParamId, LocalId, MethodDef, MethodId, ParamDef, Visibility};
use crate::error::{StateMachineError, StateMachineResult};
use crate::ty::Ty;

/// Everything the rewrite produced besides the members already declared on
/// the builder
#[derive(Debug)]
pub struct RewriteOutput {
    pub body: Block,
    pub labels: LabelTable,
    pub regions: RegionTree,
    /// Super accessors for the source method's declaring type, not attached yet
    pub accessors: Vec<MethodId>,
}

pub struct Rewriter<'a> {
    cx: &'a mut Compilation,
    builder: &'a mut SyntheticTypeBuilder,
    map: &'a GenericMap,
    bindings: &'a FieldBindings,
    options: &'a StateMachineOptions,
    source: MethodId,
    labels: LabelTable,
    regions: RegionTree,
    /// Super method -> accessor forwarding to it
    accessors: FxHashMap<MethodId, MethodId>,
    accessor_order: Vec<MethodId>,
    /// Depth of catch/finally clauses enclosing the traversal position
    handler_depth: usize,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        cx: &'a mut Compilation,
        builder: &'a mut SyntheticTypeBuilder,
        map: &'a GenericMap,
        bindings: &'a FieldBindings,
        options: &'a StateMachineOptions,
        source: MethodId,
    ) -> Self {
        Self {
            cx,
            builder,
            map,
            bindings,
            options,
            source,
            labels: LabelTable::new(),
            regions: RegionTree::new(),
            accessors: FxHashMap::default(),
            accessor_order: Vec::new(),
            handler_depth: 0,
        }
    }

    /// Rewrite the whole source body
    pub fn run(mut self, body: Block) -> StateMachineResult<RewriteOutput> {
        let body = self.rewrite_block(body)?;
        debug!(
            target: "statemachine",
            slots = self.labels.occupied(),
            regions = self.regions.converted().len(),
            accessors = self.accessor_order.len(),
            "rewrote generator body"
        );
        Ok(RewriteOutput {
            body,
            labels: self.labels,
            regions: self.regions,
            accessors: self.accessor_order,
        })
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn rewrite_block(&mut self, block: Block) -> StateMachineResult<Block> {
        let mut stmts = Vec::with_capacity(block.stmts.len());
        for stmt in block.stmts {
            self.rewrite_stmt(stmt, &mut stmts)?;
        }
        Ok(Block::new(stmts))
    }

    fn rewrite_stmt(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) -> StateMachineResult<()> {
        let Stmt { kind, span } = stmt;
        let kind = match kind {
            StmtKind::Expr(expr) => StmtKind::Expr(self.rewrite_expr(expr)?),
            StmtKind::Declare { local, ty, init } => {
                let init = self.rewrite_opt(init)?;
                if let Some(field) = self.bindings.local_field(local) {
                    // The field already exists; only the initializer survives
                    match init {
                        Some(init) => {
                            let target = Expr::new(
                                ExprKind::Field {
                                    target: Box::new(self.builder.self_expr()),
                                    field,
                                },
                                span,
                            );
                            StmtKind::Expr(Expr::new(
                                ExprKind::Assign {
                                    target: Box::new(target),
                                    value: Box::new(init),
                                },
                                span,
                            ))
                        }
                        None => return Ok(()),
                    }
                } else {
                    StmtKind::Declare {
                        local: self.handler_local(local),
                        ty: ty.map(|ty| self.map_type_ref(ty)),
                        init,
                    }
                }
            }
            StmtKind::Return(value) => StmtKind::Return(self.rewrite_opt(value)?),
            StmtKind::Yield(value) => self.rewrite_yield(value, span)?,
            StmtKind::Suspend { .. } => panic!("method {} is already lowered", self.source),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => StmtKind::If {
                cond: self.rewrite_expr(cond)?,
                then_block: self.rewrite_block(then_block)?,
                else_block: else_block.map(|b| self.rewrite_block(b)).transpose()?,
            },
            StmtKind::While { cond, body } => StmtKind::While {
                cond: self.rewrite_expr(cond)?,
                body: self.rewrite_block(body)?,
            },
            StmtKind::Block(block) => StmtKind::Block(self.rewrite_block(block)?),
            StmtKind::Try(try_stmt) => self.rewrite_try(try_stmt, span)?,
            StmtKind::Throw(value) => StmtKind::Throw(self.rewrite_opt(value)?),
            StmtKind::Break => StmtKind::Break,
            StmtKind::Continue => StmtKind::Continue,
        };
        out.push(Stmt::new(kind, span));
        Ok(())
    }

    fn rewrite_yield(&mut self, value: Option<Expr>, span: Span) -> StateMachineResult<StmtKind> {
        if self.handler_depth > 0 {
            return Err(StateMachineError::SuspensionInHandler { span });
        }
        let value = self.rewrite_opt(value)?;
        let region = self.regions.current();
        if let Some(region) = region {
            self.regions.convert(region, &mut self.labels, &*self.builder);
        }
        let state = self.labels.add_resume(region);
        trace!(target: "statemachine", state, region = ?region, "suspension point");
        Ok(StmtKind::Suspend { value, state })
    }

    fn rewrite_try(&mut self, try_stmt: TryStmt, span: Span) -> StateMachineResult<StmtKind> {
        let TryStmt {
            protected,
            handlers,
            ensure,
        } = try_stmt;

        let region = self.regions.enter(span);
        let protected = self.rewrite_block(protected);
        self.regions.leave();
        let protected = protected?;

        self.handler_depth += 1;
        let handlers: StateMachineResult<Vec<CatchClause>> =
            handlers.into_iter().map(|h| self.rewrite_handler(h)).collect();
        let ensure = ensure.map(|b| self.rewrite_block(b)).transpose();
        self.handler_depth -= 1;
        let (handlers, ensure) = (handlers?, ensure?);

        if !self.regions.get(region).straddles() {
            return Ok(StmtKind::Try(TryStmt {
                protected,
                handlers,
                ensure,
            }));
        }
        if !handlers.is_empty() {
            return Err(StateMachineError::SuspensionInHandler { span });
        }
        let block = self.regions.finalize(
            region,
            protected,
            ensure,
            &mut self.labels,
            self.builder,
            self.cx,
            self.options,
        );
        Ok(StmtKind::Block(block))
    }

    fn rewrite_handler(&mut self, clause: CatchClause) -> StateMachineResult<CatchClause> {
        Ok(CatchClause {
            local: clause.local.map(|local| self.handler_local(local)),
            ty: clause.ty.map(|ty| self.map_type_ref(ty)),
            body: self.rewrite_block(clause.body)?,
            span: clause.span,
        })
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn rewrite_opt(&mut self, expr: Option<Expr>) -> StateMachineResult<Option<Expr>> {
        expr.map(|e| self.rewrite_expr(e)).transpose()
    }

    fn rewrite_exprs(&mut self, exprs: Vec<Expr>) -> StateMachineResult<Vec<Expr>> {
        exprs.into_iter().map(|e| self.rewrite_expr(e)).collect()
    }

    fn rewrite_boxed(&mut self, expr: Box<Expr>) -> StateMachineResult<Box<Expr>> {
        Ok(Box::new(self.rewrite_expr(*expr)?))
    }

    fn rewrite_expr(&mut self, expr: Expr) -> StateMachineResult<Expr> {
        let Expr { kind, span } = expr;
        let kind = match kind {
            ExprKind::Literal(lit) => ExprKind::Literal(lit),
            ExprKind::Local(local) => match self.bindings.local_field(local) {
                Some(field) => self.self_field(field),
                None => ExprKind::Local(self.handler_local(local)),
            },
            ExprKind::Param(param) => {
                let field = self
                    .bindings
                    .param_field(param)
                    .unwrap_or_else(|| panic!("{} is referenced but was not captured", param));
                self.self_field(field)
            }
            ExprKind::Field { target, field } => ExprKind::Field {
                target: self.rewrite_boxed(target)?,
                field,
            },
            // `super` outside a call denotes the same instance as `self`
            ExprKind::SelfRef(_) | ExprKind::Super { .. } => self.back_reference(span),
            ExprKind::Member { target, method } => ExprKind::Member {
                target: self.rewrite_boxed(target)?,
                method: self.remap_method(method, span)?,
            },
            ExprKind::Call { callee, args } => self.rewrite_call(*callee, args)?,
            ExprKind::New { ty, args } => ExprKind::New {
                ty: self.map_type_ref(ty),
                args: self.rewrite_exprs(args)?,
            },
            ExprKind::BaseConstructorCall { base } => ExprKind::BaseConstructorCall {
                base: self.map.map_ty(&base),
            },
            ExprKind::Assign { target, value } => ExprKind::Assign {
                target: self.rewrite_boxed(target)?,
                value: self.rewrite_boxed(value)?,
            },
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op,
                left: self.rewrite_boxed(left)?,
                right: self.rewrite_boxed(right)?,
            },
            ExprKind::Not(operand) => ExprKind::Not(self.rewrite_boxed(operand)?),
            ExprKind::Cast { expr, ty } => ExprKind::Cast {
                expr: self.rewrite_boxed(expr)?,
                ty: self.map_type_ref(ty),
            },
        };
        Ok(Expr::new(kind, span))
    }

    fn rewrite_call(&mut self, callee: Expr, args: Vec<Expr>) -> StateMachineResult<ExprKind> {
        let args = self.rewrite_exprs(args)?;
        // Super method and the supertype instantiation it is reached through
        let super_method = match &callee.kind {
            ExprKind::Super { method: Some(method) } => {
                let declaring = self.cx.method(self.source).declaring_type;
                Some((*method, self.cx.type_def(declaring).base.clone()))
            }
            ExprKind::Member { target, method } if matches!(target.kind, ExprKind::Super { .. }) => match method {
                MethodRef::Def(method) => Some((*method, None)),
                MethodRef::Mapped { source, declaring } => Some((*source, Some(declaring.clone()))),
            },
            _ => None,
        };
        let callee = match super_method {
            Some((method, instance)) => {
                let accessor = self.super_accessor(method, instance.as_ref(), &callee);
                let method = self.accessor_ref(accessor);
                let target = Expr::new(self.back_reference(callee.span), callee.span);
                Expr::new(
                    ExprKind::Member {
                        target: Box::new(target),
                        method,
                    },
                    callee.span,
                )
            }
            None => self.rewrite_expr(callee)?,
        };
        Ok(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn self_field(&self, field: crate::entity::FieldId) -> ExprKind {
        ExprKind::Field {
            target: Box::new(self.builder.self_expr()),
            field,
        }
    }

    /// `self.<back-reference>`
    fn back_reference(&mut self, span: Span) -> ExprKind {
        let field = self.builder.back_reference(self.cx, self.options, self.map);
        ExprKind::Field {
            target: Box::new(Expr::new(ExprKind::SelfRef(self.builder.self_ty().clone()), span)),
            field,
        }
    }

    fn handler_local(&self, local: LocalId) -> LocalId {
        self.bindings
            .handler_local(local)
            .unwrap_or_else(|| panic!("{} was neither hoisted nor kept on the driver", local))
    }

    fn map_type_ref(&self, ty: TypeRef) -> TypeRef {
        TypeRef::new(self.map.map_ty(&ty.ty), ty.span)
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    /// Rebind a member access made through a generic instantiation so that
    /// its type arguments are the synthetic type's own parameters
    fn remap_method(&self, method: MethodRef, span: Span) -> StateMachineResult<MethodRef> {
        let MethodRef::Mapped { source, declaring } = method else {
            return Ok(method);
        };
        if !self.builder.is_generic() {
            return Ok(MethodRef::Mapped { source, declaring });
        }

        let def = self.cx.method(source);
        if def.is_generic() {
            return Err(StateMachineError::GenericMethodMapping {
                method: def.name.clone(),
                span,
            });
        }
        let base = declaring
            .type_def()
            .filter(|&id| self.cx.try_type_def(id).is_some_and(|def| def.is_generic()));
        let Some(base) = base else {
            return Err(StateMachineError::MissingGenericInfo {
                type_name: self.cx.display_ty(&declaring),
                span,
            });
        };

        let args = declaring
            .generic_args()
            .iter()
            .map(|arg| self.substitute_by_name(arg))
            .collect();
        Ok(MethodRef::Mapped {
            source,
            declaring: Ty::constructed(base, args),
        })
    }

    fn substitute_by_name(&self, arg: &Ty) -> Ty {
        if let Ty::GenericParam(param) = arg {
            let name = &self.cx.generic_param(*param).name;
            if let Some(own) = self.map.synthetic_by_name(&*self.cx, name) {
                return Ty::GenericParam(own);
            }
        }
        self.map.map_ty(arg)
    }

    /// Accessor on the source method's declaring type forwarding to the super
    /// method `target`; `callee` is the original super callee. The signature
    /// is taken from `target` as seen through `instance`, so it is written in
    /// the declaring type's own generic parameters.
    fn super_accessor(&mut self, target: MethodId, instance: Option<&Ty>, callee: &Expr) -> MethodId {
        if let Some(&accessor) = self.accessors.get(&target) {
            return accessor;
        }

        let prototype = self.cx.method(target).clone();
        let declaring = self.cx.method(self.source).declaring_type;
        let span = self.cx.method(self.source).span;
        let substitution = self.instantiation(instance);
        let instantiate = |ty: &Ty| {
            ty.map_generic_params(&|param| {
                substitution
                    .get(&param)
                    .cloned()
                    .unwrap_or(Ty::GenericParam(param))
            })
        };

        let mut params = Vec::with_capacity(prototype.params.len());
        let mut args = Vec::with_capacity(prototype.params.len());
        for &param in &prototype.params {
            let def = self.cx.param(param).clone();
            let forwarded = self.cx.add_param(ParamDef {
                ty: instantiate(&def.ty),
                used: true,
                ..def
            });
            params.push(forwarded);
            args.push(Expr::param(forwarded));
        }

        let call = Expr::synthetic(ExprKind::Call {
            callee: Box::new(callee.clone()),
            args,
        });
        let return_ty = instantiate(&prototype.return_ty);
        let body = if return_ty == Ty::Void {
            vec![Stmt::expr(call), Stmt::synthetic(StmtKind::Return(None))]
        } else {
            vec![Stmt::synthetic(StmtKind::Return(Some(call)))]
        };

        let name = self.cx.unique_name(&prototype.name);
        let mut def = MethodDef::new(name, declaring, return_ty, span);
        def.visibility = Visibility::Internal;
        def.params = params;
        def.body = Block::new(body);
        let accessor = self.cx.alloc_method(def);

        debug!(
            target: "statemachine",
            accessor = %self.cx.method(accessor).name,
            super_method = %prototype.name,
            "created super accessor"
        );
        self.accessors.insert(target, accessor);
        self.accessor_order.push(accessor);
        accessor
    }

    /// Generic parameters of the supertype definition bound to the arguments
    /// of `instance`
    fn instantiation(&self, instance: Option<&Ty>) -> FxHashMap<GenericParamId, Ty> {
        let Some(instance) = instance else {
            return FxHashMap::default();
        };
        let Some(def) = instance.type_def().and_then(|id| self.cx.try_type_def(id)) else {
            return FxHashMap::default();
        };
        def.generic_params
            .iter()
            .copied()
            .zip(instance.generic_args().iter().cloned())
            .collect()
    }

    /// How the synthetic type refers to an accessor of the enclosing type
    fn accessor_ref(&self, accessor: MethodId) -> MethodRef {
        let enclosing = self.builder.enclosing_ty();
        if enclosing.generic_args().is_empty() {
            MethodRef::Def(accessor)
        } else {
            MethodRef::Mapped {
                source: accessor,
                declaring: self.map.map_ty(enclosing),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{LocalDef, LocalOrigin, TypeDef};
    use crate::statemachine::builder::state_assignment;
    use crate::statemachine::hoist::{hoist_locals, hoist_parameters};
    use crate::statemachine::GeneratorKind;

    struct Fixture {
        cx: Compilation,
        method: MethodId,
        options: StateMachineOptions,
    }

    impl Fixture {
        fn new() -> Self {
            let mut cx = Compilation::new();
            let owner = cx.add_type(TypeDef::new("Owner", Span::default()));
            let method = cx.add_method(MethodDef::new("items", owner, Ty::Object, Span::default()));
            Self {
                cx,
                method,
                options: StateMachineOptions::default(),
            }
        }

        fn local(&mut self, name: &str, origin: LocalOrigin) -> LocalId {
            let local = self.cx.add_local(LocalDef {
                name: name.to_string(),
                ty: Ty::Int,
                origin,
            });
            self.cx.method_mut(self.method).locals.push(local);
            local
        }

        fn rewrite(&mut self, body: Block) -> (StateMachineResult<RewriteOutput>, SyntheticTypeBuilder, FieldBindings) {
            let (mut builder, map) =
                SyntheticTypeBuilder::new(&mut self.cx, self.method, &GeneratorKind::new(), &self.options);
            let mut bindings = FieldBindings::default();
            hoist_parameters(&mut self.cx, &mut builder, &map, self.method, &mut bindings);
            hoist_locals(&mut self.cx, &mut builder, &map, self.method, &mut bindings);
            let output = Rewriter::new(&mut self.cx, &mut builder, &map, &bindings, &self.options, self.method).run(body);
            (output, builder, bindings)
        }
    }

    fn yield_int(n: i64) -> Stmt {
        Stmt::synthetic(StmtKind::Yield(Some(Expr::int(n))))
    }

    #[test]
    fn test_yield_becomes_suspend_with_fresh_slot() {
        let mut fx = Fixture::new();
        let (output, _, _) = fx.rewrite(Block::new(vec![yield_int(1), yield_int(2)]));
        let output = output.unwrap();

        let states: Vec<usize> = output
            .body
            .stmts
            .iter()
            .map(|s| match s.kind {
                StmtKind::Suspend { state, .. } => state,
                _ => panic!("expected a suspend"),
            })
            .collect();
        assert_eq!(states, vec![2, 3]);
        assert_eq!(output.labels.occupied(), 2);
    }

    #[test]
    fn test_hoisted_declaration_becomes_assignment() {
        let mut fx = Fixture::new();
        let i = fx.local("i", LocalOrigin::Body);
        let body = Block::new(vec![Stmt::synthetic(StmtKind::Declare {
            local: i,
            ty: None,
            init: Some(Expr::int(0)),
        })]);
        let (output, _, bindings) = fx.rewrite(body);
        let output = output.unwrap();

        let field = bindings.local_field(i).unwrap();
        let StmtKind::Expr(Expr {
            kind: ExprKind::Assign { target, .. },
            ..
        }) = &output.body.stmts[0].kind
        else {
            panic!("expected an assignment");
        };
        assert!(matches!(target.kind, ExprKind::Field { field: f, .. } if f == field));
    }

    #[test]
    fn test_declaration_without_initializer_is_dropped() {
        let mut fx = Fixture::new();
        let i = fx.local("i", LocalOrigin::Body);
        let body = Block::new(vec![Stmt::synthetic(StmtKind::Declare {
            local: i,
            ty: None,
            init: None,
        })]);
        let (output, _, _) = fx.rewrite(body);
        assert!(output.unwrap().body.is_empty());
    }

    #[test]
    fn test_self_creates_back_reference_once() {
        let mut fx = Fixture::new();
        let owner_ty = Ty::Named(fx.cx.method(fx.method).declaring_type);
        let body = Block::new(vec![
            Stmt::expr(Expr::self_ref(owner_ty.clone())),
            Stmt::expr(Expr::self_ref(owner_ty)),
        ]);
        let (output, builder, _) = fx.rewrite(body);
        output.unwrap();

        let field = builder.self_field().unwrap();
        assert_eq!(fx.cx.field(field).name, "$self_$3");
        assert_eq!(builder.field_names().filter(|n| n.contains("self_")).count(), 1);
    }

    #[test]
    fn test_non_straddling_try_is_kept() {
        let mut fx = Fixture::new();
        let body = Block::new(vec![Stmt::synthetic(StmtKind::Try(TryStmt {
            protected: Block::new(vec![Stmt::expr(Expr::int(1))]),
            handlers: Vec::new(),
            ensure: Some(Block::new(vec![Stmt::expr(Expr::int(2))])),
        }))]);
        let (output, _, _) = fx.rewrite(body);
        let output = output.unwrap();

        assert!(matches!(output.body.stmts[0].kind, StmtKind::Try(_)));
        assert_eq!(output.labels.occupied(), 0);
        assert!(output.regions.converted().is_empty());
    }

    #[test]
    fn test_straddling_try_is_flattened() {
        let mut fx = Fixture::new();
        let body = Block::new(vec![Stmt::synthetic(StmtKind::Try(TryStmt {
            protected: Block::new(vec![yield_int(1)]),
            handlers: Vec::new(),
            ensure: Some(Block::new(vec![Stmt::expr(Expr::int(2))])),
        }))]);
        let (output, builder, _) = fx.rewrite(body);
        let output = output.unwrap();

        let StmtKind::Block(block) = &output.body.stmts[0].kind else {
            panic!("expected the replacement block");
        };
        assert_eq!(state_assignment(&block.stmts[0], builder.state_field()), Some(2));
        assert!(matches!(block.stmts[1].kind, StmtKind::Suspend { state: 3, .. }));
        assert_eq!(state_assignment(&block.stmts[2], builder.state_field()), Some(1));
        assert_eq!(output.labels.resolve(2), 1);
    }

    #[test]
    fn test_yield_in_finally_is_rejected() {
        let mut fx = Fixture::new();
        let body = Block::new(vec![Stmt::synthetic(StmtKind::Try(TryStmt {
            protected: Block::default(),
            handlers: Vec::new(),
            ensure: Some(Block::new(vec![yield_int(1)])),
        }))]);
        let (output, _, _) = fx.rewrite(body);
        assert!(matches!(output, Err(StateMachineError::SuspensionInHandler { .. })));
    }

    #[test]
    fn test_straddling_try_with_catch_is_rejected() {
        let mut fx = Fixture::new();
        let body = Block::new(vec![Stmt::synthetic(StmtKind::Try(TryStmt {
            protected: Block::new(vec![yield_int(1)]),
            handlers: vec![CatchClause {
                local: None,
                ty: None,
                body: Block::default(),
                span: Span::default(),
            }],
            ensure: None,
        }))]);
        let (output, _, _) = fx.rewrite(body);
        assert!(matches!(output, Err(StateMachineError::SuspensionInHandler { .. })));
    }

    #[test]
    fn test_catch_local_is_remapped() {
        let mut fx = Fixture::new();
        let e = fx.local("e", LocalOrigin::CatchClause);
        let body = Block::new(vec![Stmt::synthetic(StmtKind::Try(TryStmt {
            protected: Block::default(),
            handlers: vec![CatchClause {
                local: Some(e),
                ty: None,
                body: Block::new(vec![Stmt::expr(Expr::local(e))]),
                span: Span::default(),
            }],
            ensure: None,
        }))]);
        let (output, _, bindings) = fx.rewrite(body);
        let output = output.unwrap();

        let replacement = bindings.handler_local(e).unwrap();
        let StmtKind::Try(try_stmt) = &output.body.stmts[0].kind else {
            panic!("expected a try statement");
        };
        assert_eq!(try_stmt.handlers[0].local, Some(replacement));
        assert_eq!(
            try_stmt.handlers[0].body.stmts[0],
            Stmt::expr(Expr::local(replacement))
        );
    }

    #[test]
    #[should_panic(expected = "was not captured")]
    fn test_uncaptured_parameter_panics() {
        let mut fx = Fixture::new();
        let unused = fx.cx.add_param(ParamDef {
            name: "n".to_string(),
            ty: Ty::Int,
            used: false,
        });
        fx.cx.method_mut(fx.method).params.push(unused);
        let _ = fx.rewrite(Block::new(vec![Stmt::expr(Expr::param(unused))]));
    }
}
