//! Key-value persistence
//!
//! Scores, the ranking table and settings are stored as strings under flat
//! keys. On web this is LocalStorage; tests and the native build use the
//! in-memory store.

use std::collections::BTreeMap;

use thiserror::Error;

#[cfg(target_arch = "wasm32")]
mod local;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend missing entirely (no window, storage disabled, ...)
    #[error("storage backend unavailable")]
    Unavailable,
    /// Backend refused a read or write (quota, security policy)
    #[error("storage rejected key `{key}`: {reason}")]
    Rejected { key: String, reason: String },
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Opaque string key-value store
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persisted key names
pub mod keys {
    /// Written by the name-entry screen
    pub const PLAYER_NAME: &str = "playerName";
    pub const RANKING_TABLE: &str = "rankingTable";
    pub const SETTINGS: &str = "settings";

    pub fn last_score(name: &str) -> String {
        format!("lastScore_{name}")
    }

    pub fn best_score(name: &str) -> String {
        format!("bestScore_{name}")
    }
}

/// Read an integer score; missing, unreadable or malformed values count as 0
pub fn read_score(store: &dyn KeyValueStore, key: &str) -> u64 {
    match store.get(key) {
        Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring malformed score under `{key}`: {raw:?}");
            0
        }),
        Ok(None) => 0,
        Err(err) => {
            log::warn!("Failed to read `{key}`: {err}");
            0
        }
    }
}
