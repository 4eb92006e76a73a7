//! # Layout Storage Backends
//!
//! Adapters for the [`LayoutStore`](crate::persistence::LayoutStore) port.
//!
//! - `Memory`: volatile map, lost on exit
//! - `Redb`: one redb table on disk, ACID writes

mod redb_store;

pub use redb_store::RedbLayoutStore;

use crate::GridError;
use crate::persistence::{LayoutStore, MemoryLayoutStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Which adapter backs the layout store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Redb,
}

impl StorageBackend {
    /// Open a store of this kind. `path` is ignored for `Memory`.
    pub fn open(self, path: impl AsRef<Path>) -> Result<Arc<dyn LayoutStore>, GridError> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryLayoutStore::new())),
            Self::Redb => Ok(Arc::new(RedbLayoutStore::open(path)?)),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redb" | "file" => Ok(Self::Redb),
            other => Err(GridError::Storage(format!("unknown storage backend: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StorageBackend>().ok(), Some(StorageBackend::Memory));
        assert_eq!("redb".parse::<StorageBackend>().ok(), Some(StorageBackend::Redb));
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn memory_backend_ignores_path() {
        let store = StorageBackend::Memory
            .open("/nonexistent/dir/layouts.redb")
            .expect("memory store");
        store.set("k", "v").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
    }
}
