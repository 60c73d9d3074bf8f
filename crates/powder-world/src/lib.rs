//! Powder world simulation.
//!
//! This crate owns the grid: the spatial registry that places powders, the
//! dirty tracker feeding the renderer, and the tick scheduler that runs each
//! awake powder's behaviour chain and puts unchanged powders to sleep.

pub mod dirty;
pub mod powder;
pub mod registry;
pub mod simulation;
pub mod type_table;

pub use dirty::{DirtyEntry, DirtyTracker, PaintSurface};
pub use powder::PowderData;
pub use registry::SpatialRegistry;
pub use simulation::{Simulation, TickReport};
pub use type_table::{LoadedType, TypeTable};
