//! Integration tests for the ledgergrid HTTP API.
//!
//! Uses axum-test to drive the router without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use ledgergrid::Catalog;
use ledgergrid::api::{
    AccessPolicy, AppState, CloseSessionResponse, ErrorResponse, FacetOptionsResponse,
    GridsResponse, HealthResponse, IntentsResponse, LayoutResponse, OpenSessionResponse,
    ReplaceRowsResponse, RowActionResponse, create_router,
};
use ledgergrid_core::primitives::DEFAULT_PAGE_SIZE;
use ledgergrid_core::{
    CellValue, EmptyState, GridView, LayoutCommit, MemoryLayoutStore, RowAction, SortDirection,
};
use serde_json::{Value, json};
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn build_server(policy: AccessPolicy) -> TestServer {
    let state = AppState::new(
        Catalog::builtin(DEFAULT_PAGE_SIZE),
        Arc::new(MemoryLayoutStore::new()),
    )
    .with_access(policy);
    TestServer::new(create_router(state)).unwrap()
}

/// Create an open test server with an empty in-memory layout store.
fn create_test_server() -> TestServer {
    build_server(AccessPolicy::default())
}

fn counteragent_rows() -> Value {
    json!([
        {"name": "Acme LLC", "identification_number": "100", "entity_type": "LLC",
         "country": "Georgia", "is_active": true, "created_at": "2024-01-05"},
        {"name": "Beta JSC", "identification_number": "200", "entity_type": "JSC",
         "country": "Armenia", "is_active": false, "created_at": "2024-02-10"},
        {"name": "Gamma LLC", "identification_number": "300", "entity_type": "LLC",
         "country": "Georgia", "is_active": true, "created_at": null},
        {"name": "Delta", "identification_number": "400", "entity_type": "Sole",
         "country": null, "is_active": true}
    ])
}

async fn publish(server: &TestServer, grid: &str, rows: &Value) -> ReplaceRowsResponse {
    let response = server
        .put(&format!("/datasets/{grid}/rows"))
        .json(rows)
        .await;
    response.assert_status_ok();
    response.json()
}

async fn open_session(server: &TestServer, grid: &str) -> OpenSessionResponse {
    let response = server.post(&format!("/grids/{grid}/sessions")).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn post_view(server: &TestServer, path: &str, body: Value) -> GridView {
    let response = server.post(path).json(&body).await;
    response.assert_status_ok();
    response.json()
}

fn names(view: &GridView) -> Vec<String> {
    let name = view.columns.iter().position(|c| c.key == "name").unwrap();
    view.rows.iter().map(|r| r.cells[name].to_string()).collect()
}

fn column_keys(view: &GridView) -> Vec<&str> {
    view.columns.iter().map(|c| c.key.as_str()).collect()
}

// =============================================================================
// HEALTH / CATALOG
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_grids_lists_catalog_with_row_counts() {
    let server = create_test_server();
    publish(&server, "counteragents", &counteragent_rows()).await;

    let grids: GridsResponse = server.get("/grids").await.json();
    assert_eq!(grids.grids.len(), 8);

    let counteragents = grids.grids.iter().find(|g| g.name == "counteragents").unwrap();
    assert_eq!(counteragents.rows, 4);
    assert_eq!(counteragents.storage_key, "grid:counteragents");

    let ledger = grids.grids.iter().find(|g| g.name == "payments-ledger").unwrap();
    assert!(ledger.persist_state);
    assert!(ledger.conditions.contains(&"Balance=0".to_string()));
}

// =============================================================================
// DATASETS AND SESSIONS
// =============================================================================

#[tokio::test]
async fn test_replace_rows_validation() {
    let server = create_test_server();

    let response = server.put("/datasets/invoices/rows").json(&json!([])).await;
    response.assert_status_not_found();
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("invoices"));

    let response = server
        .put("/datasets/countries/rows")
        .json(&json!([{"code": "GE"}, "GE"]))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_unknown_grid_and_session() {
    let server = create_test_server();

    server.post("/grids/invoices/sessions").await.assert_status_not_found();
    server.get("/sessions/42/view").await.assert_status_not_found();
    server.delete("/sessions/42").await.assert_status_not_found();
}

#[tokio::test]
async fn test_session_over_empty_dataset() {
    let server = create_test_server();

    let opened = open_session(&server, "jobs").await;
    assert_eq!(opened.grid, "jobs");
    assert_eq!(opened.view.empty_state, EmptyState::NoRowsAvailable);
    assert_eq!(opened.view.page.total_pages, 0);
    // is_active is hidden by default on jobs.
    assert!(!column_keys(&opened.view).contains(&"is_active"));
}

#[tokio::test]
async fn test_filter_sort_and_facets() {
    let server = create_test_server();
    publish(&server, "counteragents", &counteragent_rows()).await;
    let id = open_session(&server, "counteragents").await.session_id;
    let base = format!("/sessions/{id}");

    // Boolean display tokens take part in search.
    let view = post_view(&server, &format!("{base}/search"), json!({"term": "INACTIVE"})).await;
    assert_eq!(names(&view), vec!["Beta JSC"]);

    let view = post_view(&server, &format!("{base}/search"), json!({"term": ""})).await;
    assert_eq!(view.page.total_rows, 4);

    let view = post_view(
        &server,
        &format!("{base}/facets/country"),
        json!({"values": ["Georgia"]}),
    )
    .await;
    assert_eq!(view.page.total_rows, 2);
    assert!(view.columns.iter().any(|c| c.key == "country" && c.filtered));

    // A column's own selection does not narrow its options.
    let options: FacetOptionsResponse = server.get(&format!("{base}/facets/country")).await.json();
    assert_eq!(options.options, vec!["", "Armenia", "Georgia"]);
    assert!(options.selected.contains("Georgia"));

    let options: FacetOptionsResponse =
        server.get(&format!("{base}/facets/entity_type")).await.json();
    assert_eq!(options.options, vec!["LLC"]);

    server
        .get(&format!("{base}/facets/nope"))
        .await
        .assert_status_not_found();

    let view = post_view(
        &server,
        &format!("{base}/sort"),
        json!({"column": "name", "direction": "desc"}),
    )
    .await;
    assert_eq!(names(&view), vec!["Gamma LLC", "Acme LLC"]);
    assert_eq!(view.sort.direction, SortDirection::Desc);

    // Header click on the active column toggles.
    let view = post_view(&server, &format!("{base}/sort"), json!({"column": "name"})).await;
    assert_eq!(names(&view), vec!["Acme LLC", "Gamma LLC"]);

    let view = post_view(&server, &format!("{base}/sort"), json!({})).await;
    assert!(view.sort.column.is_none());

    // Clearing the facet restores every row.
    let view = post_view(&server, &format!("{base}/facets/country"), json!({"values": []})).await;
    assert_eq!(view.page.total_rows, 4);
    assert_eq!(view.empty_state, EmptyState::HasRows);
}

#[tokio::test]
async fn test_no_matches_empty_state() {
    let server = create_test_server();
    publish(&server, "counteragents", &counteragent_rows()).await;
    let id = open_session(&server, "counteragents").await.session_id;

    let view = post_view(
        &server,
        &format!("/sessions/{id}/search"),
        json!({"term": "zzz-no-such"}),
    )
    .await;
    assert_eq!(view.empty_state, EmptyState::NoMatches);
    assert!(view.rows.is_empty());
}

#[tokio::test]
async fn test_ledger_conditions() {
    let server = create_test_server();
    publish(
        &server,
        "payments-ledger",
        &json!([
            {"date": "2024-01-01", "counteragent": "Acme", "accrual": 100, "due": -5, "balance": 0},
            {"date": "2024-01-02", "counteragent": "Beta", "accrual": 0, "due": 10, "balance": 10},
            {"date": "2024-01-03", "counteragent": "Gamma", "accrual": 0, "due": 0, "balance": 0}
        ]),
    )
    .await;
    let id = open_session(&server, "payments-ledger").await.session_id;
    let path = format!("/sessions/{id}/conditions");

    // Selected conditions are OR-combined.
    let view = post_view(&server, &path, json!({"conditions": ["Due<0", "Accrual>0"]})).await;
    assert_eq!(view.page.total_rows, 1);

    let view = post_view(&server, &path, json!({"conditions": ["Due<0", "Due>0"]})).await;
    assert_eq!(view.page.total_rows, 2);

    let view = post_view(&server, &path, json!({"conditions": ["Due<0", "ALL"]})).await;
    assert_eq!(view.page.total_rows, 3);

    // Money columns render as currency.
    let view = post_view(&server, &path, json!({"conditions": ["Accrual>0"]})).await;
    let accrual = view.columns.iter().position(|c| c.key == "accrual").unwrap();
    assert_eq!(view.rows[0].display[accrual], "100.00");
}

#[tokio::test]
async fn test_paging_and_dataset_refresh() {
    let server = create_test_server();
    publish(&server, "counteragents", &counteragent_rows()).await;
    let id = open_session(&server, "counteragents").await.session_id;
    let base = format!("/sessions/{id}");

    post_view(&server, &format!("{base}/sort"), json!({"column": "name"})).await;
    let view = post_view(&server, &format!("{base}/page-size"), json!({"page_size": 2})).await;
    assert_eq!(view.page.total_pages, 2);
    assert_eq!(view.page.page, 1);

    let view = post_view(&server, &format!("{base}/page"), json!({"action": "next"})).await;
    assert_eq!(names(&view), vec!["Delta", "Gamma LLC"]);
    assert!(!view.page.can_next);

    let view = post_view(&server, &format!("{base}/page"), json!({"action": "goto", "page": 99})).await;
    assert_eq!(view.page.page, 2);

    server
        .post(&format!("{base}/page-size"))
        .json(&json!({"page_size": 0}))
        .await
        .assert_status_bad_request();

    // Replacing the dataset refreshes the open session and clamps its page.
    let refreshed = publish(
        &server,
        "counteragents",
        &json!([{"name": "Solo", "is_active": true}]),
    )
    .await;
    assert_eq!(refreshed.notified, 1);
    let view: GridView = server.get(&format!("{base}/view")).await.json();
    assert_eq!(view.page.total_rows, 1);
    assert_eq!(view.page.page, 1);
    assert_eq!(names(&view), vec!["Solo"]);
}

#[tokio::test]
async fn test_viewport_hides_responsive_columns() {
    let server = create_test_server();
    let id = open_session(&server, "counteragents").await.session_id;

    let wide: GridView = server
        .get(&format!("/sessions/{id}/view?viewport=1400"))
        .await
        .json();
    assert!(column_keys(&wide).contains(&"created_at"));

    let narrow: GridView = server
        .get(&format!("/sessions/{id}/view?viewport=700"))
        .await
        .json();
    assert!(!column_keys(&narrow).contains(&"country"));
    assert!(!column_keys(&narrow).contains(&"created_at"));
    assert!(narrow.total_width < wide.total_width);

    // Later responses keep the last viewport.
    let view = post_view(&server, &format!("/sessions/{id}/search"), json!({"term": "x"})).await;
    assert_eq!(column_keys(&view), column_keys(&narrow));
}

// =============================================================================
// LAYOUT
// =============================================================================

#[tokio::test]
async fn test_column_layout_endpoints() {
    let server = create_test_server();
    let id = open_session(&server, "countries").await.session_id;
    let base = format!("/sessions/{id}");

    let view = post_view(&server, &format!("{base}/columns/name/width"), json!({"width": 10})).await;
    let name = view.columns.iter().find(|c| c.key == "name").unwrap();
    assert_eq!(name.width, 40);

    let view = post_view(
        &server,
        &format!("{base}/columns/iso3/visibility"),
        json!({"visible": false}),
    )
    .await;
    assert!(!column_keys(&view).contains(&"iso3"));

    let view = post_view(&server, &format!("{base}/columns/reorder"), json!({"from": 2, "to": 0})).await;
    assert_eq!(column_keys(&view)[0], "name");

    server
        .post(&format!("{base}/columns/reorder"))
        .json(&json!({"from": 9, "to": 0}))
        .await
        .assert_status_bad_request();
    server
        .post(&format!("{base}/columns/nope/visibility"))
        .json(&json!({"visible": true}))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_resize_and_drag_gestures() {
    let server = create_test_server();
    let id = open_session(&server, "countries").await.session_id;
    let resize = format!("/sessions/{id}/resize");
    let drag = format!("/sessions/{id}/drag");

    let begin: LayoutResponse = server
        .post(&resize)
        .json(&json!({"type": "begin", "column": "code", "x": 100}))
        .await
        .json();
    assert!(begin.commit.is_none());

    let moved: LayoutResponse = server
        .post(&resize)
        .json(&json!({"type": "move", "x": 160}))
        .await
        .json();
    assert!(moved.commit.is_none());
    assert_eq!(moved.view.columns[0].width, 140);

    let ended: LayoutResponse = server.post(&resize).json(&json!({"type": "end"})).await.json();
    assert_eq!(
        ended.commit,
        Some(LayoutCommit::Width {
            column: "code".into(),
            width: 140
        })
    );

    for event in [
        json!({"type": "start", "column": "is_active"}),
        json!({"type": "over", "column": "code"}),
    ] {
        server.post(&drag).json(&event).await.assert_status_ok();
    }
    let hovering: GridView = server.get(&format!("/sessions/{id}/view")).await.json();
    assert!(hovering.columns.iter().any(|c| c.key == "code" && c.drop_target));

    let dropped: LayoutResponse = server
        .post(&drag)
        .json(&json!({"type": "drop", "column": "code"}))
        .await
        .json();
    assert_eq!(
        dropped.commit,
        Some(LayoutCommit::Move {
            source: "is_active".into(),
            target: "code".into()
        })
    );
    assert_eq!(column_keys(&dropped.view)[..2], ["is_active", "code"]);

    server
        .post(&resize)
        .json(&json!({"type": "stretch"}))
        .await
        .assert_status_failure();
}

#[tokio::test]
async fn test_layout_persists_across_sessions_until_reset() {
    let server = create_test_server();
    let first = open_session(&server, "countries").await.session_id;
    post_view(
        &server,
        &format!("/sessions/{first}/columns/reorder"),
        json!({"from": 4, "to": 0}),
    )
    .await;

    let second = open_session(&server, "countries").await;
    assert_eq!(column_keys(&second.view)[0], "is_active");

    let reset = post_view(
        &server,
        &format!("/sessions/{}/reset-layout", second.session_id),
        json!({}),
    )
    .await;
    assert_eq!(column_keys(&reset)[0], "code");

    let third = open_session(&server, "countries").await;
    assert_eq!(column_keys(&third.view)[0], "code");
}

// =============================================================================
// ROW ACTIONS
// =============================================================================

#[tokio::test]
async fn test_row_actions() {
    let server = create_test_server();
    publish(&server, "counteragents", &counteragent_rows()).await;
    let id = open_session(&server, "counteragents").await.session_id;
    post_view(&server, &format!("/sessions/{id}/sort"), json!({"column": "name"})).await;

    let response = server.post(&format!("/sessions/{id}/rows/1/audit")).await;
    response.assert_status_ok();
    let action: RowActionResponse = response.json();
    assert_eq!(action.intent.action, RowAction::ViewAudit);
    assert_eq!(
        action.intent.row.get("name"),
        Some(&CellValue::text("Beta JSC"))
    );

    server
        .post(&format!("/sessions/{id}/rows/0/delete"))
        .await
        .assert_status_ok();

    let drained: IntentsResponse = server
        .post(&format!("/sessions/{id}/intents/drain"))
        .await
        .json();
    let actions: Vec<RowAction> = drained.intents.iter().map(|i| i.action).collect();
    assert_eq!(actions, vec![RowAction::ViewAudit, RowAction::Delete]);
    let again: IntentsResponse = server
        .post(&format!("/sessions/{id}/intents/drain"))
        .await
        .json();
    assert!(again.intents.is_empty());

    server
        .post(&format!("/sessions/{id}/rows/9/edit"))
        .await
        .assert_status_bad_request();
    server
        .post(&format!("/sessions/{id}/rows/0/archive"))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_close_session() {
    let server = create_test_server();
    let id = open_session(&server, "jobs").await.session_id;

    let closed: CloseSessionResponse = server.delete(&format!("/sessions/{id}")).await.json();
    assert!(closed.closed);
    server
        .get(&format!("/sessions/{id}/view"))
        .await
        .assert_status_not_found();
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = create_test_server();
    server.get("/unknown").await.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = create_test_server();
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = create_test_server();
    let id = open_session(&server, "jobs").await.session_id;

    let response = server
        .post(&format!("/sessions/{id}/search"))
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;
    assert!(response.status_code().is_client_error());
}

// =============================================================================
// ACCESS CONTROL TESTS
// =============================================================================

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {key}").parse().unwrap()
}

#[tokio::test]
async fn test_auth_catalog_stays_public() {
    let server = build_server(AccessPolicy::new(Some("correct-key".into()), 0));

    server.get("/health").await.assert_status_ok();
    let grids: GridsResponse = server.get("/grids").await.json();
    assert!(!grids.grids.is_empty());
}

#[tokio::test]
async fn test_auth_guards_datasets_and_sessions() {
    let api_key = "grid-secret-12345";
    let server = build_server(AccessPolicy::new(Some(api_key.into()), 0));

    let response = server.post("/grids/counteragents/sessions").await;
    response.assert_status_unauthorized();
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("missing API key"));

    server
        .put("/datasets/counteragents/rows")
        .json(&counteragent_rows())
        .add_header(header::AUTHORIZATION, bearer("wrong-key"))
        .await
        .assert_status_unauthorized();

    server
        .put("/datasets/counteragents/rows")
        .json(&counteragent_rows())
        .add_header(header::AUTHORIZATION, bearer(api_key))
        .await
        .assert_status_ok();
    let response = server
        .post("/grids/counteragents/sessions")
        .add_header(header::AUTHORIZATION, bearer(api_key))
        .await;
    response.assert_status(StatusCode::CREATED);
    let opened: OpenSessionResponse = response.json();

    server
        .get(&format!("/sessions/{}/view", opened.session_id))
        .await
        .assert_status_unauthorized();
    server
        .get(&format!("/sessions/{}/view", opened.session_id))
        .add_header(header::AUTHORIZATION, bearer(api_key))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_rate_limit_is_per_session() {
    let server = build_server(AccessPolicy::new(None, 3));
    publish(&server, "counteragents", &counteragent_rows()).await;
    let first = open_session(&server, "counteragents").await.session_id;
    let second = open_session(&server, "counteragents").await.session_id;

    let first_view = format!("/sessions/{first}/view");
    for _ in 0..3 {
        server.get(&first_view).await.assert_status_ok();
    }
    let response = server.get(&first_view).await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "Too many requests");

    server
        .get(&format!("/sessions/{second}/view"))
        .await
        .assert_status_ok();
}
