//! Build cache for one bundling session.

use super::CompiledArtifact;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Compiled artifacts kept for static bundling, keyed by module name.
///
/// Append-only: the first artifact stored for a name is kept and later
/// inserts for the same name return it unchanged. Iteration is in module
/// name order so emitted bundles are stable.
#[derive(Debug, Default)]
pub struct BuildCache {
    entries: RwLock<BTreeMap<String, Arc<CompiledArtifact>>>,
}

impl BuildCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<CompiledArtifact>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Store `artifact` under `name` unless an entry exists; returns the stored entry.
    pub fn insert(&self, name: &str, artifact: Arc<CompiledArtifact>) -> Arc<CompiledArtifact> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(name.to_string()).or_insert(artifact))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entries in module name order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Arc<CompiledArtifact>)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, artifact)| (name.clone(), Arc::clone(artifact)))
            .collect()
    }
}
