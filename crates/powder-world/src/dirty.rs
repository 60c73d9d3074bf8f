//! Pending visual updates for the renderer.

use powder_core::{Color, GridPos};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A cell whose displayed color must change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyEntry {
    pub pos: GridPos,
    pub color: Color,
}

/// Receives the dirty stream once per tick. Later entries for the same cell
/// override earlier ones.
pub trait PaintSurface {
    fn paint(&mut self, pos: GridPos, color: Color);
}

impl PaintSurface for Vec<DirtyEntry> {
    fn paint(&mut self, pos: GridPos, color: Color) {
        self.push(DirtyEntry { pos, color });
    }
}

/// Ordered list of dirty cells accumulated during a tick.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    entries: Vec<DirtyEntry>,
    positions: HashSet<GridPos>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, pos: GridPos, color: Color) {
        self.entries.push(DirtyEntry { pos, color });
        self.positions.insert(pos);
    }

    /// Whether `pos` has been touched since the last drain.
    pub fn contains(&self, pos: GridPos) -> bool {
        self.positions.contains(&pos)
    }

    pub fn entries(&self) -> &[DirtyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forward every entry in order, then clear. Returns the number painted.
    pub fn drain_into(&mut self, surface: &mut dyn PaintSurface) -> usize {
        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            surface.paint(entry.pos, entry.color);
        }
        self.positions.clear();
        count
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_drain_in_order() {
        let mut dirty = DirtyTracker::new();
        dirty.mark(GridPos::new(1, 1), Color::WHITE);
        dirty.mark(GridPos::new(2, 1), Color::WHITE);
        dirty.mark(GridPos::new(1, 1), Color::BLACK);

        assert_eq!(dirty.len(), 3);
        assert!(dirty.contains(GridPos::new(2, 1)));

        let mut painted: Vec<DirtyEntry> = Vec::new();
        assert_eq!(dirty.drain_into(&mut painted), 3);
        assert_eq!(painted[0].pos, GridPos::new(1, 1));
        assert_eq!(painted[2].color, Color::BLACK);

        assert!(dirty.is_empty());
        assert!(!dirty.contains(GridPos::new(1, 1)));
    }

    #[test]
    fn test_clear() {
        let mut dirty = DirtyTracker::new();
        dirty.mark(GridPos::new(4, 4), Color::WHITE);
        dirty.clear();

        assert!(dirty.is_empty());
        assert!(dirty.entries().is_empty());
        assert!(!dirty.contains(GridPos::new(4, 4)));
    }
}
