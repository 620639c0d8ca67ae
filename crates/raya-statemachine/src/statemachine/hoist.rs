//! Capture and hoisting
//!
//! Values that must survive a suspension point move from the stack frame of
//! the source method to fields of the state machine type. Locals declared in
//! catch or finally clauses are created and consumed within one run of the
//! driver and stay on the driver's own local list instead.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::builder::{ConstructorArg, SyntheticTypeBuilder};
use super::generic_map::GenericMap;
use crate::compilation::Compilation;
use crate::entity::{FieldId, LocalDef, LocalId, MethodId, ParamId};

/// Where each captured parameter and local of the source method now lives
#[derive(Debug, Clone, Default)]
pub struct FieldBindings {
    params: FxHashMap<ParamId, FieldId>,
    locals: FxHashMap<LocalId, FieldId>,
    /// Handler local of the source method -> its replacement on the driver
    handler_locals: FxHashMap<LocalId, LocalId>,
}

impl FieldBindings {
    fn bind_param(&mut self, param: ParamId, field: FieldId) {
        let previous = self.params.insert(param, field);
        assert!(previous.is_none(), "{} bound to more than one field", param);
    }

    fn bind_local(&mut self, local: LocalId, field: FieldId) {
        let previous = self.locals.insert(local, field);
        assert!(previous.is_none(), "{} bound to more than one field", local);
    }

    fn bind_handler_local(&mut self, local: LocalId, replacement: LocalId) {
        let previous = self.handler_locals.insert(local, replacement);
        assert!(previous.is_none(), "{} replaced twice", local);
    }

    pub fn param_field(&self, param: ParamId) -> Option<FieldId> {
        self.params.get(&param).copied()
    }

    pub fn local_field(&self, local: LocalId) -> Option<FieldId> {
        self.locals.get(&local).copied()
    }

    pub fn handler_local(&self, local: LocalId) -> Option<LocalId> {
        self.handler_locals.get(&local).copied()
    }

    /// Number of captured parameters
    pub fn captured_params(&self) -> usize {
        self.params.len()
    }

    /// Number of locals turned into fields
    pub fn hoisted_locals(&self) -> usize {
        self.locals.len()
    }
}

/// Capture every used parameter of `method` as a constructor-initialized field
pub fn hoist_parameters(
    cx: &mut Compilation,
    builder: &mut SyntheticTypeBuilder,
    map: &GenericMap,
    method: MethodId,
    bindings: &mut FieldBindings,
) {
    let params = cx.method(method).params.clone();
    for param in params {
        let def = cx.param(param);
        if !def.used {
            continue;
        }
        let name = def.name.clone();
        let ty = map.map_ty(&def.ty);
        let field = builder.add_constructor_field(cx, &name, ty, ConstructorArg::Param(param));
        trace!(target: "statemachine", param = %name, %field, "captured parameter");
        bindings.bind_param(param, field);
    }
}

/// Move the locals of `method` onto the state machine type.
///
/// The source method's local list is left untouched; it is cleared once the
/// whole method has been lowered successfully.
pub fn hoist_locals(
    cx: &mut Compilation,
    builder: &mut SyntheticTypeBuilder,
    map: &GenericMap,
    method: MethodId,
    bindings: &mut FieldBindings,
) {
    let locals = cx.method(method).locals.clone();
    for local in locals {
        let def = cx.local(local).clone();
        let ty = map.map_ty(&def.ty);
        if def.origin.is_exception_handler() {
            let replacement = cx.add_local(LocalDef {
                name: def.name,
                ty,
                origin: def.origin,
            });
            builder.add_driver_local(replacement);
            bindings.bind_handler_local(local, replacement);
            trace!(target: "statemachine", %local, %replacement, "kept handler local on the driver");
        } else {
            let name = cx.unique_name(&def.name);
            let field = builder.add_field(cx, name, ty);
            trace!(target: "statemachine", %local, %field, "hoisted local");
            bindings.bind_local(local, field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::config::StateMachineOptions;
    use crate::entity::{GenericOwner, LocalOrigin, MethodDef, ParamDef, TypeDef};
    use crate::statemachine::GeneratorKind;
    use crate::ty::Ty;

    fn generator(cx: &mut Compilation) -> MethodId {
        let owner = cx.add_type(TypeDef::new("Owner", Span::default()));
        cx.add_method(MethodDef::new("items", owner, Ty::Object, Span::default()))
    }

    fn builder_for(cx: &mut Compilation, method: MethodId) -> (SyntheticTypeBuilder, GenericMap) {
        SyntheticTypeBuilder::new(cx, method, &GeneratorKind::new(), &StateMachineOptions::default())
    }

    #[test]
    fn test_only_used_parameters_are_captured() {
        let mut cx = Compilation::new();
        let method = generator(&mut cx);
        let used = cx.add_param(ParamDef {
            name: "count".to_string(),
            ty: Ty::Int,
            used: true,
        });
        let unused = cx.add_param(ParamDef {
            name: "ignored".to_string(),
            ty: Ty::Int,
            used: false,
        });
        cx.method_mut(method).params = vec![used, unused];

        let (mut builder, map) = builder_for(&mut cx, method);
        let mut bindings = FieldBindings::default();
        hoist_parameters(&mut cx, &mut builder, &map, method, &mut bindings);

        assert!(bindings.param_field(used).is_some());
        assert_eq!(bindings.param_field(unused), None);
        assert_eq!(bindings.captured_params(), 1);
    }

    #[test]
    fn test_handler_locals_stay_on_driver() {
        let mut cx = Compilation::new();
        let method = generator(&mut cx);
        let body_local = cx.add_local(LocalDef {
            name: "i".to_string(),
            ty: Ty::Int,
            origin: LocalOrigin::Body,
        });
        let caught = cx.add_local(LocalDef {
            name: "e".to_string(),
            ty: Ty::Object,
            origin: LocalOrigin::CatchClause,
        });
        cx.method_mut(method).locals = vec![body_local, caught];

        let (mut builder, map) = builder_for(&mut cx, method);
        let mut bindings = FieldBindings::default();
        hoist_locals(&mut cx, &mut builder, &map, method, &mut bindings);

        assert!(bindings.local_field(body_local).is_some());
        assert_eq!(bindings.local_field(caught), None);
        let replacement = bindings.handler_local(caught).unwrap();
        assert_eq!(builder.driver_locals(), &[replacement]);
        assert_eq!(cx.local(replacement).name, "e");
        // Committing clears the list; hoisting alone does not
        assert_eq!(cx.method(method).locals.len(), 2);
    }

    #[test]
    fn test_same_named_locals_get_distinct_fields() {
        let mut cx = Compilation::new();
        let method = generator(&mut cx);
        let a = cx.add_local(LocalDef {
            name: "x".to_string(),
            ty: Ty::Int,
            origin: LocalOrigin::Body,
        });
        let b = cx.add_local(LocalDef {
            name: "x".to_string(),
            ty: Ty::Str,
            origin: LocalOrigin::Body,
        });
        cx.method_mut(method).locals = vec![a, b];

        let (mut builder, map) = builder_for(&mut cx, method);
        let mut bindings = FieldBindings::default();
        hoist_locals(&mut cx, &mut builder, &map, method, &mut bindings);

        let fa = bindings.local_field(a).unwrap();
        let fb = bindings.local_field(b).unwrap();
        assert_ne!(cx.field(fa).name, cx.field(fb).name);
        assert_eq!(bindings.hoisted_locals(), 2);
    }

    #[test]
    fn test_local_types_go_through_the_map() {
        let mut cx = Compilation::new();
        let owner = cx.add_type(TypeDef::new("Box", Span::default()));
        let t = cx.add_generic_param("T", GenericOwner::Type(owner));
        cx.type_def_mut(owner).generic_params.push(t);
        let method = cx.add_method(MethodDef::new("items", owner, Ty::Object, Span::default()));
        let local = cx.add_local(LocalDef {
            name: "value".to_string(),
            ty: Ty::GenericParam(t),
            origin: LocalOrigin::Body,
        });
        cx.method_mut(method).locals = vec![local];

        let (mut builder, map) = builder_for(&mut cx, method);
        let mut bindings = FieldBindings::default();
        hoist_locals(&mut cx, &mut builder, &map, method, &mut bindings);

        let field = bindings.local_field(local).unwrap();
        assert_eq!(cx.field(field).ty, Ty::GenericParam(map.map_param(t)));
        assert_ne!(cx.field(field).ty, Ty::GenericParam(t));
    }
}
