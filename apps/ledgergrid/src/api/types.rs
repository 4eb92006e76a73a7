//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Rendered pages
//! are the engine's own [`GridView`](ledgergrid_core::GridView).

use crate::error::AppError;
use crate::session::RowIntent;
use ledgergrid_core::{GridDefinition, GridView, LayoutCommit, Row, SortDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// CATALOG
// =============================================================================

/// One catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSummary {
    pub name: String,
    pub storage_key: String,
    pub columns: Vec<String>,
    pub conditions: Vec<String>,
    pub persist_state: bool,
    pub default_page_size: usize,
    /// Rows currently published for this grid's dataset.
    pub rows: usize,
}

impl GridSummary {
    #[must_use]
    pub fn new(definition: &GridDefinition, rows: usize) -> Self {
        Self {
            name: definition.name.clone(),
            storage_key: definition.storage_key.clone(),
            columns: definition.columns.iter().map(|c| c.key.clone()).collect(),
            conditions: definition.conditions.names().map(str::to_string).collect(),
            persist_state: definition.persist_state,
            default_page_size: definition.default_page_size,
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridsResponse {
    pub grids: Vec<GridSummary>,
}

// =============================================================================
// DATASETS
// =============================================================================

/// Replacement rows for a dataset: an array of JSON objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplaceRowsRequest(pub Vec<serde_json::Value>);

impl ReplaceRowsRequest {
    /// Convert to rows. Every element must be a JSON object.
    pub fn to_rows(&self) -> Result<Vec<Row>, AppError> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, value)| {
                Row::from_json(value).ok_or_else(|| {
                    AppError::InvalidArgument(format!("row {i} is not a JSON object"))
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceRowsResponse {
    pub dataset: String,
    pub rows: usize,
    /// Open sessions notified of the refresh.
    pub notified: usize,
}

// =============================================================================
// SESSIONS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionResponse {
    pub session_id: u64,
    pub grid: String,
    pub view: GridView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSessionResponse {
    pub session_id: u64,
    pub closed: bool,
}

/// `?viewport=<px>` on view requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewQuery {
    pub viewport: Option<u32>,
}

// =============================================================================
// FILTERS AND SORT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

/// Committed facet selection for a column; empty clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetRequest {
    #[serde(default)]
    pub values: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetOptionsResponse {
    pub column: String,
    /// Values reachable under every other active filter.
    pub options: Vec<String>,
    pub selected: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionsRequest {
    #[serde(default)]
    pub conditions: BTreeSet<String>,
}

/// Sort change.
///
/// - no `column`: clear the sort
/// - `column` only: header click (toggle or start ascending)
/// - `column` and `direction`: explicit sort
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortRequest {
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Page navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageRequest {
    First,
    Previous,
    Next,
    Last,
    Goto { page: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSizeRequest {
    pub page_size: usize,
}

// =============================================================================
// LAYOUT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidthRequest {
    pub width: u32,
}

/// Positional move within the full column list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

/// Result of a pointer event: the committed mutation, if the event ended a
/// gesture with one, and the page as it renders now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResponse {
    pub commit: Option<LayoutCommit>,
    pub view: GridView,
}

// =============================================================================
// ROW ACTIONS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowActionResponse {
    pub session_id: u64,
    pub index: usize,
    #[serde(flatten)]
    pub intent: RowIntent,
}

/// Row intents drained from a session, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentsResponse {
    pub session_id: u64,
    pub intents: Vec<RowIntent>,
}
