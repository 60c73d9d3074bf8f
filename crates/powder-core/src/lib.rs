//! Core types and utilities for the powder simulation.

pub mod types;
pub mod config;
pub mod error;
pub mod powder_type;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use powder_type::{PowderType, TypeCatalog};
