//! Tick scheduler for the powder world.

use crate::dirty::PaintSurface;
use crate::registry::SpatialRegistry;
use crate::type_table::TypeTable;
use powder_core::{GridConfig, Powder, Result, TypeCatalog, SWEEP_MARGIN};
use powder_runtime::BehaviourRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// Summary of a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Index of the tick that produced this report
    pub tick: u64,
    /// Powders whose behaviour chain ran
    pub evaluated: usize,
    /// Powders put to sleep because nothing about them changed
    pub slept: usize,
    /// Dirty entries handed to the paint surface
    pub dirty: usize,
}

enum Outcome {
    Skipped,
    Awake,
    Slept,
}

pub struct Simulation {
    registry: SpatialRegistry,
    behaviours: BehaviourRegistry,
    types: Arc<TypeTable>,
    /// Serials of powders already evaluated during the current sweep.
    visited: HashSet<u64>,
    tick: u64,
}

impl Simulation {
    /// Resolve every type's behaviours and build an empty grid. An unresolved
    /// behaviour reference is returned as an error.
    pub fn new(grid: &GridConfig, catalog: &TypeCatalog, behaviours: BehaviourRegistry) -> Result<Self> {
        let types = Arc::new(TypeTable::load(catalog, &behaviours)?);
        let registry = SpatialRegistry::new(grid, types.clone());

        info!(
            width = grid.width,
            height = grid.height,
            types = types.len(),
            modules = behaviours.len(),
            "Simulation created"
        );

        Ok(Self {
            registry,
            behaviours,
            types,
            visited: HashSet::new(),
            tick: 0,
        })
    }

    pub fn registry(&self) -> &SpatialRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SpatialRegistry {
        &mut self.registry
    }

    /// Number of ticks completed so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Run one step: pre-tick hooks, the sweep, post-tick hooks, then hand
    /// the dirty cells to `surface`.
    #[instrument(skip(self, surface), fields(tick = self.tick))]
    pub fn tick(&mut self, surface: &mut dyn PaintSurface) -> TickReport {
        self.visited.clear();

        self.behaviours.pre_tick(&mut self.registry);
        let (evaluated, slept) = self.sweep();
        self.behaviours.post_tick(&mut self.registry);

        let dirty = self.registry.dirty_mut().drain_into(surface);

        let report = TickReport {
            tick: self.tick,
            evaluated,
            slept,
            dirty,
        };
        self.tick += 1;

        debug!(
            evaluated,
            slept,
            dirty,
            active = self.registry.active_count(),
            sleeping = self.registry.sleeping_count(),
            "Tick complete"
        );
        report
    }

    /// Visit the grid interior in row-major order and evaluate each awake
    /// powder at most once.
    fn sweep(&mut self) -> (usize, usize) {
        let mut evaluated = 0;
        let mut slept = 0;

        for pos in self.registry.grid_size().interior(SWEEP_MARGIN) {
            let Some(powder) = self.registry.get_powder(pos) else {
                continue;
            };
            if !self.registry.is_awake(powder) {
                continue;
            }

            match self.evaluate(powder) {
                Outcome::Skipped => {}
                Outcome::Awake => evaluated += 1,
                Outcome::Slept => {
                    evaluated += 1;
                    slept += 1;
                }
            }
        }

        (evaluated, slept)
    }

    fn evaluate(&mut self, powder: Powder) -> Outcome {
        let Some(before) = self.registry.state_of(powder) else {
            return Outcome::Skipped;
        };
        if !self.visited.insert(before.serial) {
            return Outcome::Skipped;
        }
        let Some(powder_type) = self.types.get(&before.type_id) else {
            return Outcome::Skipped;
        };

        let mut keep_awake = false;
        for &behaviour in &powder_type.chain {
            // The chain stops once the powder is gone, even if its handle has
            // already been handed to a new powder.
            if self.registry.state_of(powder).map(|s| s.serial) != Some(before.serial) {
                break;
            }
            keep_awake |= self.behaviours.call(behaviour, &mut self.registry, powder);
        }

        match self.registry.state_of(powder) {
            Some(after) if after == before && !keep_awake => {
                self.registry.sleep(powder);
                trace!(powder = %powder, pos_x = after.pos.x, pos_y = after.pos.y, "Powder asleep");
                Outcome::Slept
            }
            _ => Outcome::Awake,
        }
    }
}
