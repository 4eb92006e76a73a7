//! # Column Schema Store
//!
//! Canonical column list of a grid, merged with the user's persisted layout.
//!
//! ## Reconciliation
//!
//! Persisted layouts are schema-version-free: entries are matched to the
//! canonical defaults by `key` only. For every persisted entry whose key is
//! still canonical, the structural fields (`label`, `sortable`, `filterable`,
//! `format`, `responsiveBreakpoint`) come from the code and the user
//! preferences (`visible`, `width`) from the persisted entry. Stale keys are
//! dropped; canonical keys never persisted are appended in canonical order.

use crate::primitives::MIN_COLUMN_WIDTH;
use crate::{ColumnDescriptor, GridError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// PERSISTED COLUMN
// =============================================================================

/// The user-preference part of a persisted column descriptor.
///
/// Parsing is lenient: any other field of a persisted descriptor is ignored,
/// and missing preferences fall back to the canonical value. Widths are read
/// as floating point because rendered widths are measured, not typed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedColumn {
    pub key: String,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub width: Option<f64>,
}

impl PersistedColumn {
    /// Persisted width if it is a usable positive pixel count.
    #[must_use]
    pub fn usable_width(&self) -> Option<u32> {
        let width = self.width?.round();
        (width.is_finite() && width >= 1.0).then_some(width as u32)
    }
}

impl From<&ColumnDescriptor> for PersistedColumn {
    fn from(column: &ColumnDescriptor) -> Self {
        Self {
            key: column.key.clone(),
            visible: Some(column.visible),
            width: Some(f64::from(column.width)),
        }
    }
}

/// Merge a persisted layout with the canonical defaults.
///
/// Never fails: an empty or fully stale layout yields the defaults.
#[must_use]
pub fn reconcile(
    canonical: &[ColumnDescriptor],
    persisted: &[PersistedColumn],
) -> Vec<ColumnDescriptor> {
    let mut seen = BTreeSet::new();
    let mut result = Vec::with_capacity(canonical.len());

    for entry in persisted {
        let Some(base) = canonical.iter().find(|c| c.key == entry.key) else {
            continue;
        };
        if !seen.insert(base.key.as_str()) {
            continue;
        }
        let mut merged = base.clone();
        if let Some(visible) = entry.visible {
            merged.visible = visible;
        }
        if let Some(width) = entry.usable_width() {
            merged.width = width;
        }
        result.push(merged);
    }

    for base in canonical {
        if !seen.contains(base.key.as_str()) {
            result.push(base.clone());
        }
    }

    result
}

// =============================================================================
// COLUMN SCHEMA
// =============================================================================

/// The live column list of one grid instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    canonical: Vec<ColumnDescriptor>,
    columns: Vec<ColumnDescriptor>,
    min_width: u32,
}

impl ColumnSchema {
    /// Schema in canonical order with canonical preferences.
    #[must_use]
    pub fn new(canonical: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns: canonical.clone(),
            canonical,
            min_width: MIN_COLUMN_WIDTH,
        }
    }

    /// Schema reconciled against a persisted layout.
    #[must_use]
    pub fn reconciled(canonical: Vec<ColumnDescriptor>, persisted: &[PersistedColumn]) -> Self {
        Self {
            columns: reconcile(&canonical, persisted),
            canonical,
            min_width: MIN_COLUMN_WIDTH,
        }
    }

    /// Override the minimum width used by [`ColumnSchema::set_width`].
    #[must_use]
    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width.max(1);
        self
    }

    #[must_use]
    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    /// Columns in display order, hidden ones included.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// The canonical defaults this schema was defined with.
    #[must_use]
    pub fn canonical(&self) -> &[ColumnDescriptor] {
        &self.canonical
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Columns that render at the given viewport width.
    pub fn rendered(&self, viewport: Option<u32>) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(move |c| c.renders_at(viewport))
    }

    /// Sum of the widths of visible columns.
    #[must_use]
    pub fn visible_width(&self) -> u32 {
        self.columns
            .iter()
            .filter(|c| c.visible)
            .fold(0u32, |acc, c| acc.saturating_add(c.width))
    }

    /// Show or hide a column. Returns whether anything changed.
    pub fn set_visible(&mut self, key: &str, visible: bool) -> Result<bool, GridError> {
        let column = self.get_mut(key)?;
        let changed = column.visible != visible;
        column.visible = visible;
        Ok(changed)
    }

    /// Set a column width, clamped to the minimum width. Returns the applied width.
    pub fn set_width(&mut self, key: &str, px: u32) -> Result<u32, GridError> {
        let min_width = self.min_width;
        let column = self.get_mut(key)?;
        column.width = px.max(min_width);
        Ok(column.width)
    }

    /// Move the column at `from` to position `to`.
    ///
    /// Remove-then-insert: columns between the two positions shift by one.
    /// Returns whether the order changed.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool, GridError> {
        let len = self.columns.len();
        for index in [from, to] {
            if index >= len {
                return Err(GridError::ColumnOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(false);
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        Ok(true)
    }

    /// Restore canonical order, visibility and widths.
    pub fn reset(&mut self) {
        self.columns = self.canonical.clone();
    }

    /// User preferences of every column, in display order.
    #[must_use]
    pub fn to_persisted(&self) -> Vec<PersistedColumn> {
        self.columns.iter().map(PersistedColumn::from).collect()
    }

    fn get_mut(&mut self, key: &str) -> Result<&mut ColumnDescriptor, GridError> {
        self.columns
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| GridError::UnknownColumn(key.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
