//! # Grid Definition
//!
//! Everything code says about one grid: canonical columns, searchable fields,
//! available conditions and persistence settings. Instances share it through
//! an `Arc`.

use crate::condition::ConditionRegistry;
use crate::filter::SearchSpec;
use crate::primitives::DEFAULT_PAGE_SIZE;
use crate::ColumnDescriptor;
use serde::{Deserialize, Serialize};

/// Definition of one grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDefinition {
    /// Catalog name (`counteragents`, `payments-ledger`, ...).
    pub name: String,
    /// Namespace of the persisted blobs.
    pub storage_key: String,
    /// Canonical defaults.
    pub columns: Vec<ColumnDescriptor>,
    pub search: SearchSpec,
    pub conditions: ConditionRegistry,
    /// Whether filter/sort/page size are persisted along with the columns.
    pub persist_state: bool,
    pub default_page_size: usize,
}

impl GridDefinition {
    /// A definition with no search fields (search spans all columns), no
    /// conditions and column-only persistence.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        let name = name.into();
        Self {
            storage_key: format!("grid:{name}"),
            name,
            columns,
            search: SearchSpec::default(),
            conditions: ConditionRegistry::default(),
            persist_state: false,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: SearchSpec) -> Self {
        self.search = search;
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionRegistry) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn persisting_state(mut self) -> Self {
        self.persist_state = true;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    /// Keys appearing more than once among the canonical columns.
    #[must_use]
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        self.columns
            .iter()
            .filter(|c| !seen.insert(c.key.as_str()))
            .map(|c| c.key.as_str())
            .collect()
    }
}
