//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers. Session
//! handlers first bring the session's rows up to date with the hub, then
//! apply the request and answer with the re-rendered page.

use super::{
    AppState,
    types::{
        CloseSessionResponse, ConditionsRequest, ErrorResponse, FacetOptionsResponse,
        FacetRequest, GridSummary, GridsResponse, HealthResponse, IntentsResponse,
        LayoutResponse, OpenSessionResponse, PageRequest, PageSizeRequest, ReorderRequest,
        ReplaceRowsRequest, ReplaceRowsResponse, RowActionResponse, SearchRequest, SortRequest,
        ViewQuery, VisibilityRequest, WidthRequest,
    },
};
use crate::error::AppError;
use crate::session::GridSession;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledgergrid_core::{DragEvent, GridError, GridView, ResizeEvent, RowAction};

// =============================================================================
// ERROR MAPPING
// =============================================================================

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Grid(GridError::UnknownColumn(_) | GridError::UnknownGrid(_))
            | Self::UnknownSession(_) => StatusCode::NOT_FOUND,
            Self::Grid(GridError::ColumnOutOfRange { .. } | GridError::InvalidPageSize(_))
            | Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Grid(
                GridError::Storage(_) | GridError::Serialization(_) | GridError::Deserialization(_),
            )
            | Self::Config(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;

/// Run `f` on a session whose rows are in sync with the hub.
async fn with_session<T>(
    state: &AppState,
    id: u64,
    f: impl FnOnce(&mut GridSession) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let hub = state.hub.read().await;
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or(AppError::UnknownSession(id))?;
    session.sync(&hub);
    f(session)
}

// =============================================================================
// HEALTH / CATALOG
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// List the grid catalog.
pub async fn grids_handler(State(state): State<AppState>) -> Json<GridsResponse> {
    let hub = state.hub.read().await;
    let grids = state
        .catalog
        .definitions()
        .map(|def| GridSummary::new(def, hub.rows(&def.name).len()))
        .collect();
    Json(GridsResponse { grids })
}

// =============================================================================
// DATASETS
// =============================================================================

/// Replace a dataset and refresh every session open over it.
pub async fn replace_rows_handler(
    State(state): State<AppState>,
    Path(grid): Path<String>,
    Json(request): Json<ReplaceRowsRequest>,
) -> ApiResult<ReplaceRowsResponse> {
    state.catalog.get(&grid)?;
    let rows = request.to_rows()?;
    let count = rows.len();
    let notified = state.hub.write().await.publish(&grid, rows);
    Ok(Json(ReplaceRowsResponse {
        dataset: grid,
        rows: count,
        notified,
    }))
}

// =============================================================================
// SESSION LIFECYCLE
// =============================================================================

/// Open a grid instance over the grid's dataset.
pub async fn open_session_handler(
    State(state): State<AppState>,
    Path(grid): Path<String>,
) -> Result<(StatusCode, Json<OpenSessionResponse>), AppError> {
    let definition = state.catalog.get(&grid)?;
    let id = state.next_session_id();

    let hub = state.hub.read().await;
    let mut session = GridSession::open(
        id,
        definition,
        &hub,
        state.store.clone(),
        state.min_column_width,
    );
    let view = session.view();
    state.sessions.write().await.insert(id, session);
    tracing::info!(session = id, %grid, "session opened");

    Ok((
        StatusCode::CREATED,
        Json(OpenSessionResponse {
            session_id: id,
            grid,
            view,
        }),
    ))
}

pub async fn close_session_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<CloseSessionResponse> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or(AppError::UnknownSession(id))?;
    state.access.forget_idle_sessions();
    tracing::info!(session = id, "session closed");
    Ok(Json(CloseSessionResponse {
        session_id: id,
        closed: true,
    }))
}

// =============================================================================
// VIEW
// =============================================================================

/// The rendered current page.
pub async fn view_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| Ok(s.view_at(query.viewport)))
        .await
        .map(Json)
}

// =============================================================================
// FILTERS
// =============================================================================

pub async fn search_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().set_search(request.term);
        Ok(s.view())
    })
    .await
    .map(Json)
}

pub async fn set_facet_handler(
    State(state): State<AppState>,
    Path((id, column)): Path<(u64, String)>,
    Json(request): Json<FacetRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().set_facet(&column, request.values)?;
        Ok(s.view())
    })
    .await
    .map(Json)
}

/// Reachable options for a column's facet.
pub async fn facet_options_handler(
    State(state): State<AppState>,
    Path((id, column)): Path<(u64, String)>,
) -> ApiResult<FacetOptionsResponse> {
    with_session(&state, id, |s| {
        let grid = s.grid_mut();
        let options = grid.facet_options(&column)?.to_vec();
        let selected = grid.filters().facets.get(&column).cloned().unwrap_or_default();
        Ok(FacetOptionsResponse {
            column,
            options,
            selected,
        })
    })
    .await
    .map(Json)
}

pub async fn conditions_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ConditionsRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().set_conditions(request.conditions);
        Ok(s.view())
    })
    .await
    .map(Json)
}

pub async fn sort_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<SortRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        let grid = s.grid_mut();
        match (request.column, request.direction) {
            (None, _) => grid.clear_sort(),
            (Some(column), None) => {
                grid.toggle_sort(&column)?;
            }
            (Some(column), Some(direction)) => {
                grid.sort_by(&column, direction)?;
            }
        }
        Ok(s.view())
    })
    .await
    .map(Json)
}

// =============================================================================
// PAGINATION
// =============================================================================

pub async fn page_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<PageRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        let grid = s.grid_mut();
        match request {
            PageRequest::First => grid.first_page(),
            PageRequest::Previous => grid.previous_page(),
            PageRequest::Next => grid.next_page(),
            PageRequest::Last => grid.last_page(),
            PageRequest::Goto { page } => grid.goto_page(page),
        }
        Ok(s.view())
    })
    .await
    .map(Json)
}

pub async fn page_size_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<PageSizeRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().set_page_size(request.page_size)?;
        Ok(s.view())
    })
    .await
    .map(Json)
}

// =============================================================================
// LAYOUT
// =============================================================================

pub async fn visibility_handler(
    State(state): State<AppState>,
    Path((id, column)): Path<(u64, String)>,
    Json(request): Json<VisibilityRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().set_visible(&column, request.visible)?;
        Ok(s.view())
    })
    .await
    .map(Json)
}

pub async fn width_handler(
    State(state): State<AppState>,
    Path((id, column)): Path<(u64, String)>,
    Json(request): Json<WidthRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().set_width(&column, request.width)?;
        Ok(s.view())
    })
    .await
    .map(Json)
}

pub async fn reorder_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().reorder(request.from, request.to)?;
        Ok(s.view())
    })
    .await
    .map(Json)
}

/// Column resize pointer events.
pub async fn resize_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(event): Json<ResizeEvent>,
) -> ApiResult<LayoutResponse> {
    with_session(&state, id, |s| {
        let commit = s.grid_mut().resize(event)?;
        Ok(LayoutResponse {
            commit,
            view: s.view(),
        })
    })
    .await
    .map(Json)
}

/// Column drag-and-drop pointer events.
pub async fn drag_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(event): Json<DragEvent>,
) -> ApiResult<LayoutResponse> {
    with_session(&state, id, |s| {
        let commit = s.grid_mut().drag(event)?;
        Ok(LayoutResponse {
            commit,
            view: s.view(),
        })
    })
    .await
    .map(Json)
}

pub async fn reset_layout_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<GridView> {
    with_session(&state, id, |s| {
        s.grid_mut().reset_layout();
        Ok(s.view())
    })
    .await
    .map(Json)
}

// =============================================================================
// ROW ACTIONS
// =============================================================================

/// Record an edit/delete/audit intent on a row of the current page.
pub async fn row_action_handler(
    State(state): State<AppState>,
    Path((id, index, action)): Path<(u64, usize, String)>,
) -> ApiResult<RowActionResponse> {
    let action: RowAction = action.parse().map_err(AppError::InvalidArgument)?;
    with_session(&state, id, |s| {
        let intent = s.dispatch(index, action).ok_or_else(|| {
            AppError::InvalidArgument(format!("no row {index} on the current page"))
        })?;
        Ok(RowActionResponse {
            session_id: id,
            index,
            intent,
        })
    })
    .await
    .map(Json)
}

/// Take the row intents recorded since the last drain.
pub async fn drain_intents_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<IntentsResponse> {
    with_session(&state, id, |s| {
        Ok(IntentsResponse {
            session_id: id,
            intents: s.take_intents(),
        })
    })
    .await
    .map(Json)
}
