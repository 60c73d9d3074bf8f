//! Position-indexed registry of powders.
//!
//! Owns the create/move/remove lifecycle. Each occupied cell maps to exactly
//! one handle, and every visible change is recorded in the dirty tracker.

use crate::dirty::DirtyTracker;
use crate::powder::{PowderData, PowderState};
use crate::type_table::TypeTable;
use powder_core::{Color, Error, GridConfig, GridPos, GridSize, Handle, Offset, Powder, Result};
use powder_runtime::PowderAccess;
use powder_store::{Block, PartitionedStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

pub struct SpatialRegistry {
    size: GridSize,
    background: Color,
    types: Arc<TypeTable>,
    store: PartitionedStore<PowderData>,
    locations: HashMap<GridPos, Powder>,
    dirty: DirtyTracker,
    next_serial: u64,
}

impl SpatialRegistry {
    pub fn new(config: &GridConfig, types: Arc<TypeTable>) -> Self {
        Self {
            size: config.size(),
            background: config.background,
            types,
            store: PartitionedStore::new(),
            locations: HashMap::new(),
            dirty: DirtyTracker::new(),
            next_serial: 0,
        }
    }

    /// Place a new awake powder. Fails without side effects if the cell is
    /// taken, off the grid, or the type is unknown.
    pub fn create_powder(&mut self, type_id: &str, pos: GridPos) -> Option<Powder> {
        let Some(powder_type) = self.types.get(type_id) else {
            warn!(type_id, pos_x = pos.x, pos_y = pos.y, "Cannot create powder of unknown type");
            return None;
        };
        let type_key = powder_type.id.clone();
        let color = powder_type.color;

        if let Err(e) = self.check_target(pos, None) {
            warn!(type_id, pos_x = pos.x, pos_y = pos.y, error = %e, "Powder creation rejected");
            return None;
        }

        let serial = self.next_serial;
        self.next_serial += 1;

        let handle = self
            .store
            .insert(PowderData::new(type_key, pos, Handle(u32::MAX), serial), Block::One);
        if let Some(mut data) = self.store.get_mut(handle) {
            data.handle = handle;
        }

        self.locations.insert(pos, handle);
        self.dirty.mark(pos, color);

        trace!(powder = %handle, type_id, pos_x = pos.x, pos_y = pos.y, "Powder created");
        Some(handle)
    }

    /// Remove a powder and paint its cell with the background. Dead handles
    /// are ignored.
    pub fn remove_powder(&mut self, powder: Powder) {
        let Some(pos) = self.get_powder_pos(powder) else {
            return;
        };

        self.dirty.mark(pos, self.background);
        if self.locations.get(&pos) == Some(&powder) {
            self.locations.remove(&pos);
        }

        match self.store.remove_at(powder) {
            Ok(_) => trace!(powder = %powder, pos_x = pos.x, pos_y = pos.y, "Powder removed"),
            Err(e) => warn!(powder = %powder, error = %e, "Powder vanished during removal"),
        }
    }

    /// Remove every powder on the grid.
    pub fn clear_powders(&mut self) {
        let powders: Vec<Powder> = self.locations.values().copied().collect();
        for powder in powders {
            self.remove_powder(powder);
        }
    }

    pub fn get_powder(&self, pos: GridPos) -> Option<Powder> {
        self.locations.get(&pos).copied()
    }

    pub fn get_powder_type(&self, powder: Powder) -> Option<Arc<str>> {
        self.store.get(powder).map(|data| data.type_id.clone())
    }

    pub fn get_powder_pos(&self, powder: Powder) -> Option<GridPos> {
        self.store.get(powder).map(|data| data.pos)
    }

    /// Copy of a powder's record.
    pub fn powder_data(&self, powder: Powder) -> Option<PowderData> {
        self.store.get(powder).map(|data| PowderData::clone(&data))
    }

    /// Move a powder and wake it.
    ///
    /// Moving onto the cell it already occupies succeeds and changes nothing.
    /// Both the vacated and the newly occupied cells are marked dirty.
    pub fn set_powder_pos(&mut self, powder: Powder, pos: GridPos) -> bool {
        let Some(current) = self.get_powder_pos(powder) else {
            warn!(powder = %powder, pos_x = pos.x, pos_y = pos.y, "Cannot move powder: handle is not live");
            return false;
        };
        if current == pos {
            return true;
        }

        if let Err(e) = self.check_target(pos, Some(powder)) {
            warn!(
                powder = %powder,
                from_x = current.x,
                from_y = current.y,
                to_x = pos.x,
                to_y = pos.y,
                error = %e,
                "Powder move rejected"
            );
            return false;
        }

        let type_id = {
            let Some(mut data) = self.store.get_mut(powder) else {
                return false;
            };
            data.prev_pos = data.pos;
            data.pos = pos;
            data.type_id.clone()
        };
        let color = self.color_of(&type_id);

        self.dirty.mark(current, self.background);
        self.dirty.mark(pos, color);

        self.locations.remove(&current);
        self.locations.insert(pos, powder);

        self.wake(powder);
        true
    }

    /// Move a powder by `delta`. Fails if the result would leave the grid.
    pub fn translate_powder_pos(&mut self, powder: Powder, delta: Offset) -> bool {
        let Some(current) = self.get_powder_pos(powder) else {
            warn!(powder = %powder, "Cannot translate powder: handle is not live");
            return false;
        };

        match current.offset(delta) {
            Some(target) => self.set_powder_pos(powder, target),
            None => {
                warn!(
                    powder = %powder,
                    from_x = current.x,
                    from_y = current.y,
                    dx = delta.dx,
                    dy = delta.dy,
                    "Powder translation leaves the grid"
                );
                false
            }
        }
    }

    /// Move a powder into the active block. Returns false for dead handles.
    pub fn wake(&mut self, powder: Powder) -> bool {
        self.store.move_to_block_one(powder).is_ok()
    }

    /// Move a powder into the sleeping block. Returns false for dead handles.
    pub fn sleep(&mut self, powder: Powder) -> bool {
        self.store.move_to_block_two(powder).is_ok()
    }

    pub fn is_awake(&self, powder: Powder) -> bool {
        self.store.in_block_one(powder)
    }

    pub fn contains(&self, powder: Powder) -> bool {
        self.store.contains(powder)
    }

    pub fn powder_count(&self) -> usize {
        self.store.len()
    }

    pub fn active_count(&self) -> usize {
        self.store.block_one_len()
    }

    pub fn sleeping_count(&self) -> usize {
        self.store.block_two_len()
    }

    /// Every occupied cell, sorted by position.
    pub fn powders(&self) -> Vec<(GridPos, Powder)> {
        let mut powders: Vec<_> = self.locations.iter().map(|(&pos, &p)| (pos, p)).collect();
        powders.sort();
        powders
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub(crate) fn dirty_mut(&mut self) -> &mut DirtyTracker {
        &mut self.dirty
    }

    pub(crate) fn state_of(&self, powder: Powder) -> Option<PowderState> {
        self.store.get(powder).map(|data| PowderState::from(&*data))
    }

    pub fn grid_size(&self) -> GridSize {
        self.size
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        self.size.contains(pos)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    fn color_of(&self, type_id: &str) -> Color {
        self.types.get(type_id).map_or(self.background, |t| t.color)
    }

    /// `pos` must be on the grid and either empty or held by `mover`.
    fn check_target(&self, pos: GridPos, mover: Option<Powder>) -> Result<()> {
        if !self.size.contains(pos) {
            return Err(Error::OutOfBounds {
                pos,
                size: self.size,
            });
        }
        match self.locations.get(&pos) {
            Some(&occupant) if Some(occupant) != mover => Err(Error::Occupied { pos, occupant }),
            _ => Ok(()),
        }
    }
}

impl PowderAccess for SpatialRegistry {
    fn create_powder(&mut self, type_id: &str, pos: GridPos) -> Option<Powder> {
        SpatialRegistry::create_powder(self, type_id, pos)
    }

    fn remove_powder(&mut self, powder: Powder) {
        SpatialRegistry::remove_powder(self, powder)
    }

    fn get_powder(&self, pos: GridPos) -> Option<Powder> {
        SpatialRegistry::get_powder(self, pos)
    }

    fn get_powder_type(&self, powder: Powder) -> Option<Arc<str>> {
        SpatialRegistry::get_powder_type(self, powder)
    }

    fn get_powder_pos(&self, powder: Powder) -> Option<GridPos> {
        SpatialRegistry::get_powder_pos(self, powder)
    }

    fn set_powder_pos(&mut self, powder: Powder, pos: GridPos) -> bool {
        SpatialRegistry::set_powder_pos(self, powder, pos)
    }

    fn translate_powder_pos(&mut self, powder: Powder, delta: Offset) -> bool {
        SpatialRegistry::translate_powder_pos(self, powder, delta)
    }

    fn grid_size(&self) -> GridSize {
        self.size
    }
}
