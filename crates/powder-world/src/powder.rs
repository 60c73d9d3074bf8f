//! Per-powder state held in the partitioned store.

use powder_core::{GridPos, Powder};
use std::sync::Arc;

/// A powder on the grid
#[derive(Debug, Clone)]
pub struct PowderData {
    pub pos: GridPos,
    /// Where the powder was before its last move
    pub prev_pos: GridPos,
    pub type_id: Arc<str>,
    pub handle: Powder,
    /// Unique for the lifetime of the registry, unlike handles which are
    /// recycled.
    pub(crate) serial: u64,
}

impl PowderData {
    pub(crate) fn new(type_id: Arc<str>, pos: GridPos, handle: Powder, serial: u64) -> Self {
        Self {
            pos,
            prev_pos: pos,
            type_id,
            handle,
            serial,
        }
    }

    pub fn has_moved(&self) -> bool {
        self.pos != self.prev_pos
    }
}

/// The parts of a powder that decide whether it may sleep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PowderState {
    pub pos: GridPos,
    pub type_id: Arc<str>,
    pub serial: u64,
}

impl From<&PowderData> for PowderState {
    fn from(data: &PowderData) -> Self {
        Self {
            pos: data.pos,
            type_id: data.type_id.clone(),
            serial: data.serial,
        }
    }
}
