//! Host calls available to behaviour functions.

use powder_core::{GridPos, GridSize, Offset, Powder};
use std::sync::Arc;

/// The simulation surface a behaviour may read and mutate while it runs.
///
/// Failures that are expected during a tick (occupied destination, dead
/// handle, coordinate off the grid) are reported through the return value and
/// logged by the implementor; they never abort the tick.
pub trait PowderAccess {
    /// Place a new powder of `type_id` at `pos`. `None` if the cell is taken,
    /// off the grid, or the type is unknown.
    fn create_powder(&mut self, type_id: &str, pos: GridPos) -> Option<Powder>;

    /// Remove a powder. Removing a dead handle is a no-op.
    fn remove_powder(&mut self, powder: Powder);

    fn get_powder(&self, pos: GridPos) -> Option<Powder>;

    fn get_powder_type(&self, powder: Powder) -> Option<Arc<str>>;

    fn get_powder_pos(&self, powder: Powder) -> Option<GridPos>;

    /// Move a powder and wake it. Moving onto its own cell succeeds without
    /// side effects.
    fn set_powder_pos(&mut self, powder: Powder, pos: GridPos) -> bool;

    fn translate_powder_pos(&mut self, powder: Powder, delta: Offset) -> bool {
        match self.get_powder_pos(powder).and_then(|pos| pos.offset(delta)) {
            Some(target) => self.set_powder_pos(powder, target),
            None => false,
        }
    }

    fn grid_size(&self) -> GridSize;
}
