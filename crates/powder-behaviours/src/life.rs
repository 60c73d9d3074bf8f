//! Conway-style neighbour rules.
//!
//! Every evaluated cell inspects its own neighbourhood and queues births and
//! deaths. Nothing changes during the sweep; the queues are applied in
//! `post_tick`, so every cell sees the same generation.

use powder_core::{Direction, GridPos, Powder, SWEEP_MARGIN};
use powder_runtime::{BehaviourModule, FunctionId, PowderAccess};
use std::collections::BTreeSet;
use tracing::debug;

const STEP: FunctionId = FunctionId(0);

pub struct LifeModule {
    type_id: String,
    to_kill: BTreeSet<Powder>,
    to_make: BTreeSet<GridPos>,
}

impl LifeModule {
    /// `type_id` is the type created for births.
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            to_kill: BTreeSet::new(),
            to_make: BTreeSet::new(),
        }
    }

    /// Deaths queued for the current tick
    pub fn pending_deaths(&self) -> usize {
        self.to_kill.len()
    }

    /// Births queued for the current tick
    pub fn pending_births(&self) -> usize {
        self.to_make.len()
    }

    fn neighbours(access: &dyn PowderAccess, pos: GridPos) -> impl Iterator<Item = GridPos> {
        let size = access.grid_size();
        Direction::all()
            .into_iter()
            .filter_map(move |dir| pos.offset(dir.to_offset()))
            .filter(move |p| size.contains(*p))
    }

    fn live_neighbours(access: &dyn PowderAccess, pos: GridPos) -> usize {
        Self::neighbours(access, pos)
            .filter(|p| access.get_powder(*p).is_some())
            .count()
    }

    fn step(&mut self, access: &mut dyn PowderAccess, powder: Powder) {
        let Some(pos) = access.get_powder_pos(powder) else {
            return;
        };
        let size = access.grid_size();

        let mut own_count = 0;
        for peek in Self::neighbours(access, pos) {
            let count = Self::live_neighbours(access, peek);
            match access.get_powder(peek) {
                Some(neighbour) => {
                    own_count += 1;
                    if count != 2 && count != 3 {
                        self.to_kill.insert(neighbour);
                    }
                }
                // Border cells are never swept, so nothing is born there.
                None if count == 3 && size.contains_interior(peek, SWEEP_MARGIN) => {
                    self.to_make.insert(peek);
                }
                None => {}
            }
        }

        if own_count != 2 && own_count != 3 {
            self.to_kill.insert(powder);
        }
    }
}

impl BehaviourModule for LifeModule {
    fn name(&self) -> &str {
        "life"
    }

    fn resolve(&self, function: &str) -> Option<FunctionId> {
        (function == "step").then_some(STEP)
    }

    fn call(&mut self, function: FunctionId, access: &mut dyn PowderAccess, powder: Powder) -> bool {
        if function == STEP {
            self.step(access, powder);
        }
        true
    }

    fn pre_tick(&mut self, _access: &mut dyn PowderAccess) {
        self.to_kill.clear();
        self.to_make.clear();
    }

    fn post_tick(&mut self, access: &mut dyn PowderAccess) {
        let deaths = self.to_kill.len();
        let births = self.to_make.len();

        for powder in std::mem::take(&mut self.to_kill) {
            access.remove_powder(powder);
        }
        for pos in std::mem::take(&mut self.to_make) {
            access.create_powder(&self.type_id, pos);
        }

        debug!(deaths, births, "Applied life generation");
    }
}
