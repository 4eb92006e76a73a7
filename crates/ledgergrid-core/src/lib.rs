//! # ledgergrid-core
//!
//! The interactive data-grid engine behind every business table - THE ENGINE.
//!
//! One generic engine, instantiated per grid definition, replaces the
//! per-screen copies of the same logic:
//!
//! - column schema with persisted layout and reconciliation on load
//! - free-text search, per-column facets and OR-combined named conditions
//! - type-aware single-column sort with a fixed null policy
//! - client-side pagination
//! - resize / reorder pointer state machines
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network
//! - Rows are injected and never mutated; refresh replaces them wholesale
//! - Derived views are memoized on input revisions
//! - Recoverable problems (bad persisted layout, no-op gestures) fall back
//!   to defaults and are logged; they never surface as errors

// =============================================================================
// MODULES
// =============================================================================

pub mod condition;
pub mod definition;
pub mod display;
pub mod facet;
pub mod filter;
pub mod grid;
pub mod layout;
pub mod memo;
pub mod pagination;
pub mod persistence;
pub mod primitives;
pub mod schema;
pub mod sort;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Breakpoint, CellValue, ColumnDescriptor, ColumnFormat, FilterState, GridError, GridRecord,
    PaginationState, Row, SortDirection, SortState,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use condition::{CompareOp, ConditionRegistry, ConditionRule};
pub use definition::GridDefinition;
pub use display::format_cell;
pub use facet::{FacetPopover, compare_facet_values, unique_values};
pub use filter::{FilterEngine, SearchField, SearchSpec};
pub use grid::{EmptyState, Grid, GridView, RowAction, RowActions, ViewColumn, ViewRow};
pub use layout::{
    DragEvent, DragTracker, LayoutCommit, LayoutInteraction, ResizeEvent, ResizeTracker,
};
pub use pagination::{PageInfo, page_slice, total_pages};
pub use schema::{ColumnSchema, PersistedColumn, reconcile};
pub use sort::compare_cells;

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use persistence::{LayoutPersistence, LayoutStore, MemoryLayoutStore, PersistedState};
pub use storage::{RedbLayoutStore, StorageBackend};
