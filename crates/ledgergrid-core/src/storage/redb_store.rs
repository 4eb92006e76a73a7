//! # redb-backed Layout Store
//!
//! Persisted layouts in a single redb table, `layouts: &str -> &str`.
//! Every `set`/`remove` is its own write transaction.

use crate::GridError;
use crate::persistence::LayoutStore;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for layouts: storage key -> JSON blob
const LAYOUTS: TableDefinition<&str, &str> = TableDefinition::new("layouts");

fn storage_err(e: impl std::fmt::Display) -> GridError {
    GridError::Storage(e.to_string())
}

/// A disk-backed layout store.
pub struct RedbLayoutStore {
    db: Database,
}

impl std::fmt::Debug for RedbLayoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbLayoutStore").finish_non_exhaustive()
    }
}

impl RedbLayoutStore {
    /// Open or create a layout database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Create the table up front so reads on a fresh file succeed.
        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let _ = write_txn.open_table(LAYOUTS).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        tracing::debug!(path = %path.as_ref().display(), "layout store opened");
        Ok(Self { db })
    }
}

impl LayoutStore for RedbLayoutStore {
    fn get(&self, key: &str) -> Result<Option<String>, GridError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(LAYOUTS).map_err(storage_err)?;
        Ok(table
            .get(key)
            .map_err(storage_err)?
            .map(|v| v.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GridError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(LAYOUTS).map_err(storage_err)?;
            table.insert(key, value).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }

    fn remove(&self, key: &str) -> Result<(), GridError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(LAYOUTS).map_err(storage_err)?;
            table.remove(key).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }
}
