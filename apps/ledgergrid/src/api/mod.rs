//! # ledgergrid HTTP API Module
//!
//! This module implements the HTTP JSON API server using axum. The service
//! hosts grid sessions: each session is one grid instance over a named
//! dataset, driven by the requests below.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /grids` - Grid catalog
//! - `PUT /datasets/{grid}/rows` - Replace a dataset and refresh its sessions
//! - `POST /grids/{grid}/sessions` - Open a session
//! - `DELETE /sessions/{id}` - Close a session
//! - `GET /sessions/{id}/view?viewport=px` - Rendered page
//! - `POST /sessions/{id}/search|conditions|sort|page|page-size` - Filter, sort, page
//! - `GET|POST /sessions/{id}/facets/{column}` - Facet options / selection
//! - `POST /sessions/{id}/columns/{column}/visibility|width` - Column layout
//! - `POST /sessions/{id}/columns/reorder` - Positional column move
//! - `POST /sessions/{id}/resize|drag` - Pointer events
//! - `POST /sessions/{id}/rows/{index}/{action}` - Row action intents
//! - `POST /sessions/{id}/intents/drain` - Take the pending row intents
//! - `POST /sessions/{id}/reset-layout` - Restore canonical columns
//!
//! ## Security
//!
//! API key and per-session quotas come from `[server]` in the config file
//! (see [`AccessPolicy`]). CORS origins come from `LEDGERGRID_CORS_ORIGINS`:
//! a comma-separated list, or "*" for all (default: localhost only).

mod access;
mod handlers;
mod types;

pub use access::{AccessPolicy, QuotaKey};
pub use types::{
    CloseSessionResponse, ConditionsRequest, ErrorResponse, FacetOptionsResponse, FacetRequest,
    GridSummary, GridsResponse, HealthResponse, IntentsResponse, LayoutResponse,
    OpenSessionResponse, PageRequest, PageSizeRequest, ReorderRequest, ReplaceRowsRequest,
    ReplaceRowsResponse, RowActionResponse, SearchRequest, SortRequest, ViewQuery,
    VisibilityRequest, WidthRequest,
};

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::hub::DatasetHub;
use crate::session::GridSession;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use ledgergrid_core::LayoutStore;
use ledgergrid_core::primitives::MIN_COLUMN_WIDTH;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request body limit; datasets are replaced wholesale.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// Lock order: `hub` before `sessions`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn LayoutStore>,
    pub hub: Arc<RwLock<DatasetHub>>,
    pub sessions: Arc<RwLock<BTreeMap<u64, GridSession>>>,
    pub min_column_width: u32,
    pub access: Arc<AccessPolicy>,
    next_session: Arc<AtomicU64>,
}

impl AppState {
    /// Create new app state over a catalog and a layout store.
    #[must_use]
    pub fn new(catalog: Catalog, store: Arc<dyn LayoutStore>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
            hub: Arc::new(RwLock::new(DatasetHub::new())),
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            min_column_width: MIN_COLUMN_WIDTH,
            access: Arc::new(AccessPolicy::default()),
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    #[must_use]
    pub fn with_min_column_width(mut self, min_width: u32) -> Self {
        self.min_column_width = min_width.max(1);
        self
    }

    #[must_use]
    pub fn with_access(mut self, policy: AccessPolicy) -> Self {
        self.access = Arc::new(policy);
        self
    }

    fn next_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `LEDGERGRID_CORS_ORIGINS`.
///
/// - `*`: any origin (development only)
/// - unset, or no valid origin listed: localhost only
/// - otherwise: the comma-separated origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("LEDGERGRID_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (LEDGERGRID_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in LEDGERGRID_CORS_ORIGINS, defaulting to localhost only"
                );
                cors_for(localhost_origins())
            } else {
                cors_for(allowed)
            }
        }
        None => {
            tracing::info!("CORS: No LEDGERGRID_CORS_ORIGINS set, defaulting to localhost only");
            cors_for(localhost_origins())
        }
    }
}

fn localhost_origins() -> Vec<HeaderValue> {
    [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect()
}

fn cors_for(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Access - API key and quotas, unless the policy is open
pub fn create_router(state: AppState) -> Router {
    let policy = Arc::clone(&state.access);
    if policy.requires_key() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - session endpoints are publicly accessible! \
             Set server.api_key or LEDGERGRID_API_KEY to enable authentication."
        );
    }
    if policy.is_rate_limited() {
        tracing::info!("Per-session rate limiting enabled");
    } else {
        tracing::info!("Rate limiting disabled");
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/grids", get(handlers::grids_handler))
        .route("/datasets/{grid}/rows", put(handlers::replace_rows_handler))
        .route("/grids/{grid}/sessions", post(handlers::open_session_handler))
        .route(
            "/sessions/{id}",
            axum::routing::delete(handlers::close_session_handler),
        )
        .route("/sessions/{id}/view", get(handlers::view_handler))
        .route("/sessions/{id}/search", post(handlers::search_handler))
        .route(
            "/sessions/{id}/facets/{column}",
            get(handlers::facet_options_handler).post(handlers::set_facet_handler),
        )
        .route("/sessions/{id}/conditions", post(handlers::conditions_handler))
        .route("/sessions/{id}/sort", post(handlers::sort_handler))
        .route("/sessions/{id}/page", post(handlers::page_handler))
        .route("/sessions/{id}/page-size", post(handlers::page_size_handler))
        .route(
            "/sessions/{id}/columns/reorder",
            post(handlers::reorder_handler),
        )
        .route(
            "/sessions/{id}/columns/{column}/visibility",
            post(handlers::visibility_handler),
        )
        .route(
            "/sessions/{id}/columns/{column}/width",
            post(handlers::width_handler),
        )
        .route("/sessions/{id}/resize", post(handlers::resize_handler))
        .route("/sessions/{id}/drag", post(handlers::drag_handler))
        .route(
            "/sessions/{id}/rows/{index}/{action}",
            post(handlers::row_action_handler),
        )
        .route(
            "/sessions/{id}/intents/drain",
            post(handlers::drain_intents_handler),
        )
        .route(
            "/sessions/{id}/reset-layout",
            post(handlers::reset_layout_handler),
        );

    if !policy.is_open() {
        router = router.layer(axum_middleware::from_fn_with_state(
            policy,
            access::access_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), AppError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("ledgergrid HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}
