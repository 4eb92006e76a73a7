//! # Grid State
//!
//! Filter, sort and pagination state. These are plain values: the grid owns
//! them and re-derives its view from them.

use crate::primitives::{ALL_CONDITIONS, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SORT
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Single active sort key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// Sort by `column` in `direction`.
    #[must_use]
    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    /// Header click: same column toggles direction, a new column resets to asc.
    pub fn click(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.direction = self.direction.toggled();
        } else {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Asc;
        }
    }

    /// Direction for `column` if it is the active sort key.
    #[must_use]
    pub fn direction_for(&self, column: &str) -> Option<SortDirection> {
        (self.column.as_deref() == Some(column)).then_some(self.direction)
    }
}

// =============================================================================
// FILTER
// =============================================================================

/// Search term, per-column facets and selected conditions.
///
/// An empty facet set means "no constraint from that column". An empty
/// condition set, or one containing [`ALL_CONDITIONS`], means no constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub search_term: String,
    pub facets: BTreeMap<String, BTreeSet<String>>,
    pub conditions: BTreeSet<String>,
}

impl FilterState {
    /// Whether the search term constrains anything.
    #[must_use]
    pub fn has_search(&self) -> bool {
        !self.search_term.trim().is_empty()
    }

    /// Committed facet selection for a column, if non-empty.
    #[must_use]
    pub fn facet(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.facets.get(column).filter(|set| !set.is_empty())
    }

    /// Whether any column carries a non-empty facet.
    #[must_use]
    pub fn has_facets(&self) -> bool {
        self.facets.values().any(|set| !set.is_empty())
    }

    /// Whether the condition selection constrains anything.
    #[must_use]
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty() && !self.conditions.contains(ALL_CONDITIONS)
    }

    /// Whether any filter input is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.has_search() || self.has_facets() || self.has_conditions()
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// 1-based page and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationState {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }
}
