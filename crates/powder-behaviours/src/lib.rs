//! Behaviour modules shipped with the simulation.
//!
//! - `life`: cellular-automaton neighbour rules

pub mod life;

pub use life::LifeModule;

use powder_core::{Color, PowderType, Result, TypeCatalog};
use powder_runtime::BehaviourRegistry;

/// Type id of the built-in life cell
pub const LIFE_TYPE: &str = "life";

/// Type definitions used when no type directory is configured.
pub fn builtin_catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    let life = PowderType {
        display_name: "Life".to_string(),
        ..PowderType::new(LIFE_TYPE, Color::WHITE).with_behaviour("life:step")
    };
    // Cannot collide in an empty catalog.
    let _ = catalog.insert(life);
    catalog
}

/// Register every built-in module with `registry`.
pub fn register_builtins(registry: &mut BehaviourRegistry) -> Result<()> {
    registry.register(Box::new(LifeModule::new(LIFE_TYPE)))
}
