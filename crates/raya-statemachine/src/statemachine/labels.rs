//! Label/State Table
//!
//! Ordered registry of resumption slots. The slot index is the value stored in
//! the state field; driver dispatch and dispose synthesis read the table to
//! decide where each state resumes and which ensure-methods guard it.

use super::try_region::RegionId;

/// State of a machine that has not run yet
pub const ENTRY_STATE: usize = 0;

/// Terminal state; resuming from it does nothing
pub const FINISHED_STATE: usize = 1;

/// Number of reserved slots at the start of every table
pub const RESERVED_SLOTS: usize = 2;

/// What resuming from a slot does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Start of the body
    Entry,
    /// The terminal slot
    Finished,
    /// Resume right after a suspension point
    Resume,
    /// Guard slot of a straddling region: dispatches like [`SlotKind::Finished`]
    FinishedAlias,
}

/// One entry of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub kind: SlotKind,
    /// Innermost straddling region the slot belongs to
    pub owner: Option<RegionId>,
}

/// The shared, ordered slot table of one state machine
#[derive(Debug, Clone)]
pub struct LabelTable {
    slots: Vec<Slot>,
}

impl LabelTable {
    /// Create a table holding only the entry and finished slots
    pub fn new() -> Self {
        Self {
            slots: vec![
                Slot {
                    kind: SlotKind::Entry,
                    owner: None,
                },
                Slot {
                    kind: SlotKind::Finished,
                    owner: None,
                },
            ],
        }
    }

    pub fn finished_state(&self) -> usize {
        FINISHED_STATE
    }

    /// Allocate the slot resumed after a suspension point
    pub fn add_resume(&mut self, owner: Option<RegionId>) -> usize {
        self.push(SlotKind::Resume, owner)
    }

    /// Allocate the guard slot of a straddling region
    pub fn add_region_guard(&mut self, region: RegionId) -> usize {
        self.push(SlotKind::FinishedAlias, Some(region))
    }

    fn push(&mut self, kind: SlotKind, owner: Option<RegionId>) -> usize {
        let state = self.slots.len();
        self.slots.push(Slot { kind, owner });
        state
    }

    pub fn slot(&self, state: usize) -> Option<&Slot> {
        self.slots.get(state)
    }

    /// Owning region of a slot
    pub fn owner(&self, state: usize) -> Option<RegionId> {
        self.slot(state).and_then(|s| s.owner)
    }

    /// The slot dispatch actually jumps to when resuming from `state`
    pub fn resolve(&self, state: usize) -> usize {
        match self.slot(state).map(|s| s.kind) {
            Some(SlotKind::FinishedAlias) => FINISHED_STATE,
            _ => state,
        }
    }

    /// Total number of slots, reserved ones included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots consumed by suspension points and region conversions
    pub fn occupied(&self) -> usize {
        self.slots.len() - RESERVED_SLOTS
    }

    /// Iterate `(state, slot)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots.iter().enumerate()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new()
    }
}
