//! Powder type definitions and the catalog they are loaded into.

use crate::error::{Error, Result};
use crate::types::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Static description of a kind of powder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowderType {
    /// Key used to create powders of this type
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub color: Color,
    /// Ordered `"module:function"` references run on each evaluation
    #[serde(default)]
    pub behaviours: Vec<String>,
}

impl PowderType {
    pub fn new(id: impl Into<String>, color: Color) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            color,
            behaviours: Vec::new(),
        }
    }

    pub fn with_behaviour(mut self, reference: impl Into<String>) -> Self {
        self.behaviours.push(reference.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Configuration("powder type has an empty id".to_string()));
        }
        Ok(())
    }
}

/// Ordered set of powder types keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: Vec<PowderType>,
    by_id: HashMap<String, usize>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type. Fails if the id is empty or already present.
    pub fn insert(&mut self, powder_type: PowderType) -> Result<()> {
        powder_type.validate()?;
        if self.by_id.contains_key(&powder_type.id) {
            return Err(Error::Configuration(format!(
                "duplicate powder type '{}'",
                powder_type.id
            )));
        }
        self.by_id.insert(powder_type.id.clone(), self.types.len());
        self.types.push(powder_type);
        Ok(())
    }

    /// Parse a JSON array of type definitions.
    ///
    /// A document that is not an array is an error. Individual entries that
    /// fail to parse or validate are skipped with a warning.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(text)?;
        let mut catalog = Self::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let parsed = serde_json::from_value::<PowderType>(entry)
                .map_err(Error::from)
                .and_then(|powder_type| catalog.insert(powder_type));

            if let Err(e) = parsed {
                warn!(entry = index, error = %e, "Skipping invalid powder type definition");
            }
        }

        Ok(catalog)
    }

    /// Load every `*.json` file in `dir` as a single type definition.
    ///
    /// Unreadable or invalid files are skipped with a warning; only failure to
    /// list the directory itself is an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut catalog = Self::new();
        for path in paths {
            let loaded = std::fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|text| serde_json::from_str::<PowderType>(&text).map_err(Error::from))
                .and_then(|powder_type| catalog.insert(powder_type));

            match loaded {
                Ok(()) => debug!(file = %path.display(), "Loaded powder type"),
                Err(e) => warn!(file = %path.display(), error = %e, "Invalid powder type file"),
            }
        }

        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&PowderType> {
        self.by_id.get(id).map(|&index| &self.types[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowderType> {
        self.types.iter()
    }
}
