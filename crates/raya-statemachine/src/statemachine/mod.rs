//! Generator lowering
//!
//! Turns a method containing suspension points into a state machine type:
//! persisted fields for everything that outlives a suspension, an integer
//! state cursor and a driver method that resumes from the last suspension
//! point on every call.
//!
//! # Pipeline
//!
//! ```text
//! SyntheticTypeBuilder::new   allocate the type, clone generics
//!        |
//! hoist_parameters / hoist_locals
//!        |
//! Rewriter::run               rewrite references, claim slots, flatten regions
//!        |
//! commit                      attach accessors, register the type
//! ```
//!
//! Nothing becomes visible in the [`Compilation`] unless every step succeeds.

mod builder;
mod generic_map;
mod hoist;
mod labels;
mod rewrite;
mod try_region;

pub use builder::{state_assignment, Capabilities, ConstructorArg, SyntheticType, SyntheticTypeBuilder};
pub use generic_map::GenericMap;
pub use hoist::{hoist_locals, hoist_parameters, FieldBindings};
pub use labels::{LabelTable, Slot, SlotKind, ENTRY_STATE, FINISHED_STATE, RESERVED_SLOTS};
pub use rewrite::{RewriteOutput, Rewriter};
pub use try_region::{ConvertedRegion, RegionId, RegionTree, TryRegion};

use tracing::{debug, warn};

use crate::ast::Expr;
use crate::compilation::Compilation;
use crate::config::StateMachineOptions;
use crate::entity::{MethodDef, MethodId};
use crate::error::StateMachineResult;
use crate::ty::Ty;

/// Hook deciding what kind of state machine a method becomes
pub trait StateMachineKind {
    /// Base name of the synthetic type, before unique-name allocation
    fn type_name(&self, method: &MethodDef, options: &StateMachineOptions) -> String;

    /// Supertype and capabilities of the synthetic type. Types must already be
    /// expressed in the synthetic type's generic parameters (see `map`).
    fn configure(&self, cx: &Compilation, method: &MethodDef, map: &GenericMap) -> Capabilities;

    /// Return type of the driver method
    fn driver_return_ty(&self) -> Ty {
        Ty::Bool
    }
}

/// Iterator-style generator: the driver returns whether a value was produced
#[derive(Debug, Clone, Default)]
pub struct GeneratorKind {
    base: Option<Ty>,
    capabilities: Vec<Ty>,
}

impl GeneratorKind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supertype of generated types, written in the source method's generics
    pub fn with_base(mut self, base: Ty) -> Self {
        self.base = Some(base);
        self
    }

    /// Capability implemented by generated types, written in the source
    /// method's generics
    pub fn with_capability(mut self, capability: Ty) -> Self {
        self.capabilities.push(capability);
        self
    }
}

impl StateMachineKind for GeneratorKind {
    fn type_name(&self, method: &MethodDef, options: &StateMachineOptions) -> String {
        format!("{}{}", method.name, options.type_name_suffix)
    }

    fn configure(&self, _cx: &Compilation, _method: &MethodDef, map: &GenericMap) -> Capabilities {
        Capabilities {
            base: self.base.as_ref().map(|base| map.map_ty(base)),
            interfaces: self.capabilities.iter().map(|c| map.map_ty(c)).collect(),
        }
    }
}

/// Result of lowering one method
#[derive(Debug, Clone)]
pub struct StateMachine {
    pub synthetic: SyntheticType,
    pub labels: LabelTable,
    /// Straddling regions, in source order
    pub regions: Vec<ConvertedRegion>,
    /// Accessors added to the source method's declaring type
    pub accessors: Vec<MethodId>,
    /// Expression to substitute for calls of the source method
    pub construction: Expr,
    pub bindings: FieldBindings,
    pub generic_map: GenericMap,
}

impl StateMachine {
    pub fn region(&self, id: RegionId) -> Option<&ConvertedRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Ensure-methods to run, innermost first, when the machine is abandoned
    /// while parked in `state`
    pub fn cleanup_chain(&self, state: usize) -> Vec<MethodId> {
        let mut chain = Vec::new();
        let mut current = self.labels.owner(state);
        while let Some(region) = current.and_then(|id| self.region(id)) {
            chain.push(region.ensure_method);
            current = region.parent;
        }
        chain
    }
}

/// Lower `method` into a state machine registered in `cx`.
///
/// Unsupported constructs are reported on the compilation's diagnostic
/// channel and returned; in that case neither the synthetic type nor any
/// accessor is added, and the source method is left as it was.
pub fn transform_method(
    cx: &mut Compilation,
    method: MethodId,
    kind: &dyn StateMachineKind,
    options: &StateMachineOptions,
) -> StateMachineResult<StateMachine> {
    if cx.name_template() != options.unique_name_template {
        warn!(
            target: "statemachine",
            compilation = %cx.name_template(),
            configured = %options.unique_name_template,
            "unique_name_template is ignored; the compilation was created with another template"
        );
    }

    let (mut builder, generic_map) = SyntheticTypeBuilder::new(cx, method, kind, options);
    let mut bindings = FieldBindings::default();
    hoist_parameters(cx, &mut builder, &generic_map, method, &mut bindings);
    hoist_locals(cx, &mut builder, &generic_map, method, &mut bindings);

    let body = cx.method(method).body.clone();
    let rewritten = Rewriter::new(cx, &mut builder, &generic_map, &bindings, options, method).run(body);
    let RewriteOutput {
        body,
        labels,
        regions,
        accessors,
    } = match rewritten {
        Ok(output) => output,
        Err(error) => {
            warn!(
                target: "statemachine",
                method = %cx.method(method).name,
                %error,
                "state machine lowering failed"
            );
            cx.report(error.clone());
            return Err(error);
        }
    };

    let declaring = cx.method(method).declaring_type;
    cx.type_def_mut(declaring).methods.extend(accessors.iter().copied());
    cx.method_mut(method).locals.clear();

    let construction = builder.construction_expr();
    let synthetic = builder.finish(cx, body);
    debug!(
        target: "statemachine",
        method = %cx.method(method).name,
        synthetic = %cx.type_def(synthetic.id).name,
        slots = labels.occupied(),
        "lowered generator"
    );

    Ok(StateMachine {
        synthetic,
        labels,
        regions: regions.converted(),
        accessors,
        construction,
        bindings,
        generic_map,
    })
}
