//! Chunk assembly

use indexmap::IndexMap;
use serde::Serialize;

use crate::compilation::Module;

/// The modules emitted together for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub name: String,
    pub entry_module: String,
    /// Module ids in registry order
    pub modules: Vec<String>,
}

/// One chunk per entry, holding every registry module the entry owns
pub fn assemble_chunks(
    entries: &IndexMap<String, String>,
    registry: &IndexMap<String, Module>,
) -> Vec<Chunk> {
    entries
        .iter()
        .map(|(name, entry_module)| Chunk {
            name: name.clone(),
            entry_module: entry_module.clone(),
            modules: registry
                .values()
                .filter(|module| module.entries.iter().any(|owner| owner == name))
                .map(|module| module.id.clone())
                .collect(),
        })
        .collect()
}
