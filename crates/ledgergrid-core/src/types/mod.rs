//! # Core Type Definitions
//!
//! This module contains the data model of the grid engine:
//! - Cell values and rows (`CellValue`, `Row`, `GridRecord`)
//! - Column descriptors (`ColumnDescriptor`, `Breakpoint`, `ColumnFormat`)
//! - Grid state (`FilterState`, `SortState`, `PaginationState`)
//! - Error types (`GridError`)

mod column;
mod state;
mod value;

pub use column::{Breakpoint, ColumnDescriptor, ColumnFormat};
pub use state::{FilterState, PaginationState, SortDirection, SortState};
pub use value::{CellValue, GridRecord, Row};

pub(crate) use value::parse_number;

use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the grid engine.
///
/// Only explicit mutations with invalid arguments and storage adapters
/// return these. Recoveries (malformed persisted layout, no-op gestures)
/// are logged and never surface as errors.
#[derive(Debug, Error)]
pub enum GridError {
    /// The column key is not part of the schema.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A positional column index is outside the schema.
    #[error("Column index {index} out of range (len {len})")]
    ColumnOutOfRange { index: usize, len: usize },

    /// Page sizes must be positive.
    #[error("Invalid page size: {0}")]
    InvalidPageSize(usize),

    /// No grid definition is registered under this name.
    #[error("Unknown grid: {0}")]
    UnknownGrid(String),

    /// The layout store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
