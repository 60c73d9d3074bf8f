//! Error types for the simulation.

use crate::types::{GridPos, GridSize, Handle};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Handle {0} is not live")]
    InvalidHandle(Handle),

    #[error("Position {pos} is outside the {size} grid")]
    OutOfBounds { pos: GridPos, size: GridSize },

    #[error("Position {pos} is already occupied by powder {occupant}")]
    Occupied { pos: GridPos, occupant: Handle },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid behaviour '{reference}': {reason}")]
    InvalidBehaviour { reference: String, reason: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
