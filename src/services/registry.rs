//! Persisted id registries
//!
//! Small insertion-ordered sets of entity ids (tracked buses, favorite
//! stops) backed by JSON array files in the app data directory. Every
//! mutation writes through; a failed save is logged and the in-memory
//! set stays authoritative for the session.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::utils::config_store;

/// An insertion-ordered set of string ids with write-through persistence
pub struct IdRegistry {
    name: &'static str,
    path: PathBuf,
    ids: Mutex<Vec<String>>,
}

impl IdRegistry {
    /// Load a registry from its backing file. A missing file yields an
    /// empty set; an unreadable one is logged and treated the same.
    pub fn load(name: &'static str, path: PathBuf) -> Self {
        let ids: Vec<String> = match config_store::load_json(&path) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("{}: could not load {}: {:#}", name, path.display(), e);
                Vec::new()
            }
        };
        Self {
            name,
            path,
            ids: Mutex::new(ids),
        }
    }

    /// Add an id. Returns false when it was already present.
    pub fn add(&self, id: &str) -> bool {
        let mut ids = self.lock();
        if ids.iter().any(|existing| existing == id) {
            return false;
        }
        ids.push(id.to_string());
        self.save(&ids);
        true
    }

    /// Remove an id. Returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        let mut ids = self.lock();
        let before = ids.len();
        ids.retain(|existing| existing != id);
        let removed = ids.len() != before;
        if removed {
            self.save(&ids);
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|existing| existing == id)
    }

    /// All ids in insertion order
    pub fn all(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn save(&self, ids: &[String]) {
        if let Err(e) = config_store::save_json(&self.path, ids) {
            tracing::warn!("{}: could not save {}: {:#}", self.name, self.path.display(), e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.ids.lock().expect("id registry poisoned")
    }
}

impl std::fmt::Debug for IdRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdRegistry")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
