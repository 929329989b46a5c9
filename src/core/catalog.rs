//! In-memory model directory.
//!
//! Holds the most recent tags listing and answers the one policy question
//! the interface needs: which models belong in the Vision tab. Capability
//! detection is name-pattern based, since the tags endpoint reports no
//! capability metadata.

use crate::api::ModelEntry;

#[derive(Debug, Default)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog wholesale with a fresh listing. Daemon order is
    /// preserved; there is no incremental update.
    pub fn replace(&mut self, entries: Vec<ModelEntry>) {
        self.entries = entries;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All model names, in daemon order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Names of models the Vision tab should offer.
    pub fn vision_names(&self, patterns: &[String]) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.name.as_str())
            .filter(|name| is_vision_model(name, patterns))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}

/// Whether a model name matches any of the vision patterns.
pub fn is_vision_model(name: &str, patterns: &[String]) -> bool {
    let name = name.to_ascii_lowercase();
    patterns.iter().any(|p| name.contains(p.as_str()))
}
