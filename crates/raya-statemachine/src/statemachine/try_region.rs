//! Try/Finally Region Conversion
//!
//! A driver that returns at every suspension point cannot rely on structured
//! unwinding to run a finally block that was entered on an earlier call. Each
//! protected region that straddles a suspension point is therefore flattened:
//!
//! ```text
//! try { A; yield x; B } ensure { C }
//!
//! // becomes
//! self.state = <guard slot>
//! A; self.state = <resume slot>; suspend x; B
//! self.state = <enclosing guard slot | finished>
//! self.$ensure<guard slot>()        // private method whose body is C
//! ```
//!
//! The guard slot dispatches like the finished state, so re-entering the
//! driver while parked on it neither re-runs the protected block nor fires the
//! ensure-method again.

use std::fmt;

use tracing::debug;

use super::builder::SyntheticTypeBuilder;
use super::labels::LabelTable;
use crate::ast::{Block, Span};
use crate::compilation::Compilation;
use crate::config::StateMachineOptions;
use crate::entity::MethodId;

/// Index of a protected region in its [`RegionTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u32);

impl RegionId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region{}", self.0)
    }
}

/// Bookkeeping for one protected region of the source body
#[derive(Debug, Clone)]
pub struct TryRegion {
    pub parent: Option<RegionId>,
    pub span: Span,
    /// Set once a suspension point is found inside; never reset
    straddles: bool,
    /// Guard slot, assigned together with `straddles`
    state: Option<usize>,
    /// Replacement block under construction
    replacement: Option<Block>,
    ensure_method: Option<MethodId>,
    finalized: bool,
}

impl TryRegion {
    pub fn straddles(&self) -> bool {
        self.straddles
    }

    pub fn state(&self) -> Option<usize> {
        self.state
    }

    pub fn ensure_method(&self) -> Option<MethodId> {
        self.ensure_method
    }
}

/// A region that straddled a suspension point, as handed to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertedRegion {
    pub id: RegionId,
    pub parent: Option<RegionId>,
    /// Guard slot number
    pub state: usize,
    pub ensure_method: MethodId,
}

/// Tree of protected regions mirroring the nesting in the source body
#[derive(Debug, Default)]
pub struct RegionTree {
    regions: Vec<TryRegion>,
    /// Regions enclosing the current traversal position, innermost last
    active: Vec<RegionId>,
}

impl RegionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a region nested in the current one
    pub fn enter(&mut self, span: Span) -> RegionId {
        let id = RegionId::new(self.regions.len() as u32);
        self.regions.push(TryRegion {
            parent: self.current(),
            span,
            straddles: false,
            state: None,
            replacement: None,
            ensure_method: None,
            finalized: false,
        });
        self.active.push(id);
        id
    }

    /// Stop tracking the innermost region
    pub fn leave(&mut self) -> Option<RegionId> {
        self.active.pop()
    }

    /// The innermost region enclosing the traversal position
    pub fn current(&self) -> Option<RegionId> {
        self.active.last().copied()
    }

    pub fn get(&self, id: RegionId) -> &TryRegion {
        &self.regions[id.0 as usize]
    }

    fn get_mut(&mut self, id: RegionId) -> &mut TryRegion {
        &mut self.regions[id.0 as usize]
    }

    /// Mark `id` as straddling: claim its guard slot and start its replacement
    /// block. Converting an already straddling region does nothing.
    pub fn convert(&mut self, id: RegionId, labels: &mut LabelTable, builder: &SyntheticTypeBuilder) {
        if self.get(id).straddles {
            return;
        }
        let state = labels.add_region_guard(id);
        let region = self.get_mut(id);
        region.straddles = true;
        region.state = Some(state);
        region.replacement = Some(Block::new(vec![builder.set_state(state)]));
        debug!(target: "statemachine", region = %id, state, "region straddles a suspension point");
    }

    /// Complete the replacement of a straddling region once its protected
    /// block has been rewritten. Converts the enclosing region, declares the
    /// ensure-method and returns the block that replaces the try statement.
    ///
    /// # Panics
    /// If the region does not straddle or was already finalized.
    pub fn finalize(
        &mut self,
        id: RegionId,
        protected: Block,
        ensure: Option<Block>,
        labels: &mut LabelTable,
        builder: &mut SyntheticTypeBuilder,
        cx: &mut Compilation,
        options: &StateMachineOptions,
    ) -> Block {
        let region = self.get_mut(id);
        assert!(!region.finalized, "{} finalized twice", id);
        region.finalized = true;
        let (Some(state), Some(mut replacement)) = (region.state, region.replacement.take()) else {
            panic!("{} finalized without straddling a suspension point", id);
        };
        let parent = region.parent;

        replacement.stmts.extend(protected.stmts);
        match parent {
            Some(parent) => {
                self.convert(parent, labels, builder);
                let parent_state = self
                    .get(parent)
                    .state
                    .unwrap_or_else(|| panic!("{} has no guard slot", parent));
                replacement.push(builder.set_state(parent_state));
            }
            None => replacement.push(builder.set_state(labels.finished_state())),
        }

        let name = format!("{}{}", options.ensure_method_prefix, state);
        let ensure_method = builder.add_ensure_method(cx, name, ensure.unwrap_or_default());
        replacement.push(builder.call_on_self(ensure_method));
        self.get_mut(id).ensure_method = Some(ensure_method);

        debug!(
            target: "statemachine",
            region = %id,
            state,
            parent = ?parent,
            "converted protected region"
        );
        replacement
    }

    /// Straddling regions, in the order they were entered
    pub fn converted(&self) -> Vec<ConvertedRegion> {
        self.regions
            .iter()
            .enumerate()
            .filter_map(|(index, region)| {
                Some(ConvertedRegion {
                    id: RegionId::new(index as u32),
                    parent: region.parent,
                    state: region.state?,
                    ensure_method: region.ensure_method?,
                })
            })
            .collect()
    }

    /// Number of regions seen, straddling or not
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Stmt};
    use crate::entity::{MethodDef, TypeDef};
    use crate::statemachine::builder::state_assignment;
    use crate::statemachine::GeneratorKind;
    use crate::ty::Ty;

    fn fixture() -> (Compilation, SyntheticTypeBuilder, StateMachineOptions) {
        let mut cx = Compilation::new();
        let owner = cx.add_type(TypeDef::new("Owner", Span::default()));
        let method = cx.add_method(MethodDef::new("items", owner, Ty::Object, Span::default()));
        let options = StateMachineOptions::default();
        let (builder, _) = SyntheticTypeBuilder::new(&mut cx, method, &GeneratorKind::new(), &options);
        (cx, builder, options)
    }

    #[test]
    fn test_enter_tracks_parent_chain() {
        let mut tree = RegionTree::new();
        let outer = tree.enter(Span::default());
        let inner = tree.enter(Span::default());

        assert_eq!(tree.get(inner).parent, Some(outer));
        assert_eq!(tree.get(outer).parent, None);
        assert_eq!(tree.leave(), Some(inner));
        assert_eq!(tree.current(), Some(outer));
    }

    #[test]
    fn test_convert_is_idempotent() {
        let (_cx, builder, _) = fixture();
        let mut labels = LabelTable::new();
        let mut tree = RegionTree::new();
        let region = tree.enter(Span::default());

        tree.convert(region, &mut labels, &builder);
        tree.convert(region, &mut labels, &builder);

        assert_eq!(labels.occupied(), 1);
        assert_eq!(tree.get(region).state(), Some(2));
    }

    #[test]
    fn test_finalize_top_level_resets_to_finished() {
        let (mut cx, mut builder, options) = fixture();
        let mut labels = LabelTable::new();
        let mut tree = RegionTree::new();
        let region = tree.enter(Span::default());
        tree.convert(region, &mut labels, &builder);
        tree.leave();

        let protected = Block::new(vec![Stmt::expr(Expr::int(7))]);
        let block = tree.finalize(region, protected, None, &mut labels, &mut builder, &mut cx, &options);

        let state_field = builder.state_field();
        assert_eq!(block.stmts.len(), 4);
        assert_eq!(state_assignment(&block.stmts[0], state_field), Some(2));
        assert_eq!(state_assignment(&block.stmts[2], state_field), Some(1));
        let ensure = tree.get(region).ensure_method().unwrap();
        assert_eq!(cx.method(ensure).name, "$ensure2");
    }

    #[test]
    fn test_finalize_nested_converts_parent() {
        let (mut cx, mut builder, options) = fixture();
        let mut labels = LabelTable::new();
        let mut tree = RegionTree::new();
        let outer = tree.enter(Span::default());
        let inner = tree.enter(Span::default());
        tree.convert(inner, &mut labels, &builder);
        tree.leave();

        let block = tree.finalize(inner, Block::default(), None, &mut labels, &mut builder, &mut cx, &options);

        assert!(tree.get(outer).straddles());
        let outer_state = tree.get(outer).state().unwrap();
        assert_eq!(outer_state, 3);
        assert_eq!(state_assignment(&block.stmts[1], builder.state_field()), Some(3));
        assert_eq!(tree.converted().len(), 1);
    }

    #[test]
    #[should_panic(expected = "finalized twice")]
    fn test_finalize_twice_panics() {
        let (mut cx, mut builder, options) = fixture();
        let mut labels = LabelTable::new();
        let mut tree = RegionTree::new();
        let region = tree.enter(Span::default());
        tree.convert(region, &mut labels, &builder);
        tree.finalize(region, Block::default(), None, &mut labels, &mut builder, &mut cx, &options);
        tree.finalize(region, Block::default(), None, &mut labels, &mut builder, &mut cx, &options);
    }
}
