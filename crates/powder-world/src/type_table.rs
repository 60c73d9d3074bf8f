//! Powder types with their behaviour chains resolved.

use powder_core::{Color, Result, TypeCatalog};
use powder_runtime::{BehaviourId, BehaviourRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A powder type ready for dispatch.
#[derive(Debug, Clone)]
pub struct LoadedType {
    pub id: Arc<str>,
    pub display_name: String,
    pub color: Color,
    /// Behaviours in the order they run
    pub chain: Vec<BehaviourId>,
}

/// Read-only table of every loaded powder type.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: HashMap<Arc<str>, LoadedType>,
}

impl TypeTable {
    /// Resolve every type's behaviour references. The first reference that
    /// does not resolve aborts the load.
    pub fn load(catalog: &TypeCatalog, behaviours: &BehaviourRegistry) -> Result<Self> {
        let mut types = HashMap::with_capacity(catalog.len());

        for def in catalog.iter() {
            let chain = def
                .behaviours
                .iter()
                .map(|reference| behaviours.resolve(reference))
                .collect::<Result<Vec<_>>>()?;

            let id: Arc<str> = Arc::from(def.id.as_str());
            types.insert(
                id.clone(),
                LoadedType {
                    id,
                    display_name: def.display_name.clone(),
                    color: def.color,
                    chain,
                },
            );
        }

        info!(types = types.len(), "Loaded powder types");
        Ok(Self { types })
    }

    pub fn get(&self, id: &str) -> Option<&LoadedType> {
        self.types.get(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
