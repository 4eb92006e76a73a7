//! # Persistence Adapter
//!
//! Serializes a grid's column layout (and, for grids that persist it, its
//! filter/sort/page-size state) into a key-value [`LayoutStore`].
//!
//! Keys are `<storage_key>:columns` and `<storage_key>:state`; values are
//! JSON text. Reads never fail to the caller: a store error or a malformed
//! blob is logged and treated as "nothing persisted". Writes replace the
//! whole blob, so replaying one is harmless.

use crate::primitives::{COLUMNS_KEY_SUFFIX, STATE_KEY_SUFFIX};
use crate::schema::PersistedColumn;
use crate::{ColumnDescriptor, FilterState, GridError, SortState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

// =============================================================================
// LAYOUT STORE PORT
// =============================================================================

/// Minimal string key-value store holding persisted layouts.
pub trait LayoutStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, GridError>;
    fn set(&self, key: &str, value: &str) -> Result<(), GridError>;
    fn remove(&self, key: &str) -> Result<(), GridError>;
}

/// Volatile store, one map per process.
#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryLayoutStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, GridError> {
        self.entries
            .lock()
            .map_err(|e| GridError::Storage(e.to_string()))
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn get(&self, key: &str) -> Result<Option<String>, GridError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GridError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), GridError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// =============================================================================
// PERSISTED STATE
// =============================================================================

/// Filter, sort and page size as stored for grids that persist them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub filters: FilterState,
    pub sort: SortState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

// =============================================================================
// ADAPTER
// =============================================================================

/// Persistence for one grid instance.
#[derive(Debug, Clone)]
pub struct LayoutPersistence {
    store: Arc<dyn LayoutStore>,
    storage_key: String,
}

impl LayoutPersistence {
    #[must_use]
    pub fn new(store: Arc<dyn LayoutStore>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
        }
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn columns_key(&self) -> String {
        format!("{}{COLUMNS_KEY_SUFFIX}", self.storage_key)
    }

    #[must_use]
    pub fn state_key(&self) -> String {
        format!("{}{STATE_KEY_SUFFIX}", self.storage_key)
    }

    /// Persisted column preferences; empty when absent or unreadable.
    #[must_use]
    pub fn load_columns(&self) -> Vec<PersistedColumn> {
        self.load(&self.columns_key()).unwrap_or_default()
    }

    /// Persisted filter/sort/page-size state, if any.
    #[must_use]
    pub fn load_state(&self) -> Option<PersistedState> {
        self.load(&self.state_key())
    }

    /// Replace the column blob with the full descriptor list.
    pub fn save_columns(&self, columns: &[ColumnDescriptor]) {
        self.save(&self.columns_key(), columns);
    }

    pub fn save_state(&self, state: &PersistedState) {
        self.save(&self.state_key(), state);
    }

    /// Remove both blobs.
    pub fn clear(&self) {
        for key in [self.columns_key(), self.state_key()] {
            if let Err(error) = self.store.remove(&key) {
                tracing::warn!(grid = %self.storage_key, %key, %error, "failed to remove persisted layout");
            }
        }
    }

    fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(grid = %self.storage_key, %key, %error, "layout store read failed, using defaults");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(grid = %self.storage_key, %key, %error, "malformed persisted layout, using defaults");
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|e| GridError::Serialization(e.to_string()))
            .and_then(|json| self.store.set(key, &json));
        match result {
            Ok(()) => tracing::debug!(grid = %self.storage_key, %key, "layout persisted"),
            Err(error) => {
                tracing::warn!(grid = %self.storage_key, %key, %error, "failed to persist layout");
            }
        }
    }
}
