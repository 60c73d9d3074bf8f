//! Configuration types for the simulation.

use crate::error::Result;
use crate::types::{Color, GridSize};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cells this far from an edge are never evaluated by the sweep.
pub const SWEEP_MARGIN: u32 = 1;

/// Grid configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of the grid in cells
    pub width: u32,
    /// Height of the grid in cells
    pub height: u32,
    /// Color painted into a cell when its powder leaves or is removed
    pub background: Color,
}

impl GridConfig {
    pub fn size(&self) -> GridSize {
        GridSize::new(self.width, self.height)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 72,
            background: Color::BLACK,
        }
    }
}

/// Tick dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Simulation steps per second
    pub tick_rate_hz: u32,
    /// Stop after this many ticks (run until interrupted if unset)
    pub max_ticks: Option<u64>,
    /// Emit a population summary every this many ticks
    pub log_interval_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            max_ticks: None,
            log_interval_ticks: 300,
        }
    }
}

/// Initial population scatter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Fraction of interior cells seeded with life (0.0 to 1.0)
    pub life_density: f32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            life_density: 0.2,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: Option<String>,
}

/// Top-level simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid: GridConfig,
    pub tick: TickConfig,
    pub seed: SeedConfig,
    pub logging: LoggingConfig,
    /// Directory of powder type definitions (built-in types if unset)
    pub type_dir: Option<String>,
}

impl SimConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
