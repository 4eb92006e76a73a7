//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! `view` and `facets` read the persisted layout but never write it: they run
//! over an in-memory snapshot of the grid's blobs. `columns` and `reset`
//! write through to the configured store.

use super::{FilterArgs, StoreSettings};
use crate::api::{self, AccessPolicy, AppState};
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::error::AppError;
use ledgergrid_core::{
    EmptyState, Grid, GridDefinition, GridView, LayoutPersistence, LayoutStore,
    MemoryLayoutStore, Row, SortDirection, StorageBackend,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE INPUT
// =============================================================================

/// Maximum size of a row file (100 MB).
const MAX_ROWS_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Resolve a row file path, requiring an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Read a JSON array of row objects.
pub fn load_rows(path: &Path) -> Result<Vec<Row>, AppError> {
    let path = validate_file_path(path)?;
    let metadata = std::fs::metadata(&path)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_ROWS_FILE_SIZE {
        return Err(AppError::InvalidArgument(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_ROWS_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(&path)
        .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&text).map_err(|e| {
        AppError::InvalidArgument(format!("'{}' is not a JSON array: {}", path.display(), e))
    })?;
    api::ReplaceRowsRequest(values).to_rows()
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

/// `column=v1,v2` → column and value set. `column=` clears the facet.
fn parse_facet(raw: &str) -> Result<(String, BTreeSet<String>), AppError> {
    let (column, values) = raw.split_once('=').ok_or_else(|| {
        AppError::InvalidArgument(format!("facet '{raw}' is not column=value,..."))
    })?;
    let values = values
        .split(',')
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((column.trim().to_string(), values))
}

/// `column`, `column:asc` or `column:desc`.
fn parse_sort(raw: &str) -> Result<(String, SortDirection), AppError> {
    match raw.rsplit_once(':') {
        None => Ok((raw.to_string(), SortDirection::Asc)),
        Some((column, dir)) => {
            let direction = match dir.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(AppError::InvalidArgument(format!(
                        "sort direction '{other}' is not asc or desc"
                    )));
                }
            };
            Ok((column.to_string(), direction))
        }
    }
}

/// `column=px`.
fn parse_width(raw: &str) -> Result<(String, u32), AppError> {
    raw.split_once('=')
        .and_then(|(column, px)| Some((column.to_string(), px.trim().parse().ok()?)))
        .ok_or_else(|| AppError::InvalidArgument(format!("width '{raw}' is not column=px")))
}

/// A `--move` argument.
#[derive(Debug, PartialEq, Eq)]
enum ColumnMove {
    Positions(usize, usize),
    Keys(String, String),
}

fn parse_move(raw: &str) -> Result<ColumnMove, AppError> {
    let (source, target) = raw.split_once(':').ok_or_else(|| {
        AppError::InvalidArgument(format!("move '{raw}' is not source:target"))
    })?;
    Ok(match (source.parse(), target.parse()) {
        (Ok(from), Ok(to)) => ColumnMove::Positions(from, to),
        _ => ColumnMove::Keys(source.to_string(), target.to_string()),
    })
}

// =============================================================================
// GRID SETUP
// =============================================================================

fn catalog(config: &AppConfig) -> Catalog {
    Catalog::builtin(config.grid.default_page_size)
}

fn open_store(settings: &StoreSettings) -> Result<Arc<dyn LayoutStore>, AppError> {
    if settings.backend == StorageBackend::Redb {
        tracing::debug!(path = %settings.path.display(), "opening layout store");
    }
    Ok(settings.backend.open(&settings.path)?)
}

/// A volatile copy of one grid's persisted blobs.
fn snapshot_store(
    store: &Arc<dyn LayoutStore>,
    definition: &GridDefinition,
) -> Result<Arc<dyn LayoutStore>, AppError> {
    let persistence = LayoutPersistence::new(Arc::clone(store), definition.storage_key.clone());
    let snapshot = MemoryLayoutStore::new();
    for key in [persistence.columns_key(), persistence.state_key()] {
        if let Some(value) = store.get(&key)? {
            snapshot.set(&key, &value)?;
        }
    }
    Ok(Arc::new(snapshot))
}

/// A grid over `rows` with the persisted layout, detached from the store.
fn open_detached(
    config: &AppConfig,
    settings: &StoreSettings,
    grid: &str,
    rows: Vec<Row>,
) -> Result<Grid<Row>, AppError> {
    let definition = catalog(config).get(grid)?;
    let store = snapshot_store(&open_store(settings)?, &definition)?;
    Ok(Grid::open(definition, Arc::new(rows), store).with_min_width(config.grid.min_column_width))
}

fn apply_filters(grid: &mut Grid<Row>, filters: &FilterArgs) -> Result<(), AppError> {
    if let Some(term) = &filters.search {
        grid.set_search(term.clone());
    }
    for raw in &filters.facets {
        let (column, values) = parse_facet(raw)?;
        grid.set_facet(&column, values)?;
    }
    if !filters.conditions.is_empty() {
        grid.set_conditions(filters.conditions.iter().cloned().collect());
    }
    Ok(())
}

// =============================================================================
// RENDERING
// =============================================================================

/// Plain-text table of a rendered page.
pub fn render_table(view: &GridView) -> String {
    let headers: Vec<String> = view
        .columns
        .iter()
        .map(|c| match c.sort {
            Some(SortDirection::Asc) => format!("{} ↑", c.label),
            Some(SortDirection::Desc) => format!("{} ↓", c.label),
            None if c.filtered => format!("{} *", c.label),
            None => c.label.clone(),
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            view.rows
                .iter()
                .filter_map(|row| row.display.get(i))
                .map(|text| text.chars().count())
                .fold(header.chars().count(), usize::max)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&table_line(&headers, &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &view.rows {
        out.push_str(&table_line(&row.display, &widths));
        out.push('\n');
    }

    match view.empty_state {
        EmptyState::NoRowsAvailable => out.push_str("No rows available\n"),
        EmptyState::NoMatches => out.push_str("No rows match the current filters\n"),
        EmptyState::HasRows => out.push_str(&format!(
            "Page {} of {} ({} rows)\n",
            view.page.page, view.page.total_pages, view.page.total_rows
        )),
    }
    out
}

fn table_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(text, width)| format!("{:<width$}", text, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Grid(ledgergrid_core::GridError::Serialization(e.to_string())))?;
    println!("{text}");
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(
    config: &AppConfig,
    settings: &StoreSettings,
    host: &str,
    port: u16,
) -> Result<(), AppError> {
    let store = open_store(settings)?;
    let state = AppState::new(catalog(config), store)
        .with_min_column_width(config.grid.min_column_width)
        .with_access(AccessPolicy::from_config(&config.server));

    println!("ledgergrid server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:    {}", host);
    println!("  Port:    {}", port);
    println!("  Backend: {:?}", settings.backend);
    println!("  Store:   {}", settings.path.display());
    println!(
        "  API key: {}",
        if config.server.api_key.is_some() { "required" } else { "none" }
    );
    println!("  Rate:    {} req/s per session", config.server.rate_limit);
    println!();
    println!("Endpoints:");
    println!("  GET  /grids                         - Grid catalog");
    println!("  PUT  /datasets/{{grid}}/rows          - Replace a dataset");
    println!("  POST /grids/{{grid}}/sessions         - Open a grid session");
    println!("  GET  /sessions/{{id}}/view            - Rendered page");
    println!("  GET  /health                        - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// GRIDS COMMAND
// =============================================================================

pub fn cmd_grids(config: &AppConfig, json_mode: bool) -> Result<(), AppError> {
    let catalog = catalog(config);

    if json_mode {
        let grids: Vec<_> = catalog
            .definitions()
            .map(|def| {
                serde_json::json!({
                    "name": def.name,
                    "storage_key": def.storage_key,
                    "columns": def.columns.iter().map(|c| &c.key).collect::<Vec<_>>(),
                    "conditions": def.conditions.names().collect::<Vec<_>>(),
                    "persist_state": def.persist_state,
                })
            })
            .collect();
        return print_json(&grids);
    }

    println!("Grids");
    println!("=====");
    for def in catalog.definitions() {
        let extras = match (def.conditions.len(), def.persist_state) {
            (0, false) => String::new(),
            (0, true) => "  [persists state]".to_string(),
            (n, false) => format!("  [{n} conditions]"),
            (n, true) => format!("  [{n} conditions, persists state]"),
        };
        println!("{:<16} {:>2} columns{}", def.name, def.columns.len(), extras);
    }
    Ok(())
}

// =============================================================================
// VIEW COMMAND
// =============================================================================

/// Arguments of `view`.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub grid: String,
    pub rows: PathBuf,
    pub filters: FilterArgs,
    pub sort: Option<String>,
    pub page: usize,
    pub page_size: Option<usize>,
    pub viewport: Option<u32>,
}

/// Build the page `view` prints.
pub fn build_view(
    config: &AppConfig,
    settings: &StoreSettings,
    options: &ViewOptions,
) -> Result<GridView, AppError> {
    let rows = load_rows(&options.rows)?;
    let mut grid = open_detached(config, settings, &options.grid, rows)?;

    apply_filters(&mut grid, &options.filters)?;
    if let Some(size) = options.page_size {
        grid.set_page_size(size)?;
    }
    if let Some(raw) = &options.sort {
        let (column, direction) = parse_sort(raw)?;
        if !grid.sort_by(&column, direction)? {
            tracing::warn!(%column, "column is not sortable, ignoring --sort");
        }
    }
    grid.goto_page(options.page);
    Ok(grid.view(options.viewport))
}

pub fn cmd_view(
    config: &AppConfig,
    settings: &StoreSettings,
    json_mode: bool,
    options: &ViewOptions,
) -> Result<(), AppError> {
    let view = build_view(config, settings, options)?;
    if json_mode {
        return print_json(&view);
    }
    print!("{}", render_table(&view));
    Ok(())
}

// =============================================================================
// FACETS COMMAND
// =============================================================================

/// Reachable options of `column` under the given filters.
pub fn facet_options(
    config: &AppConfig,
    settings: &StoreSettings,
    grid: &str,
    column: &str,
    rows: &Path,
    filters: &FilterArgs,
) -> Result<Vec<String>, AppError> {
    let rows = load_rows(rows)?;
    let mut grid = open_detached(config, settings, grid, rows)?;
    apply_filters(&mut grid, filters)?;
    Ok(grid.facet_options(column)?.to_vec())
}

pub fn cmd_facets(
    config: &AppConfig,
    settings: &StoreSettings,
    json_mode: bool,
    grid: &str,
    column: &str,
    rows: &Path,
    filters: &FilterArgs,
) -> Result<(), AppError> {
    let options = facet_options(config, settings, grid, column, rows, filters)?;
    if json_mode {
        return print_json(&serde_json::json!({ "column": column, "options": options }));
    }
    for option in &options {
        // Null cells facet as the empty string.
        if option.is_empty() {
            println!("(empty)");
        } else {
            println!("{option}");
        }
    }
    Ok(())
}

// =============================================================================
// COLUMNS COMMAND
// =============================================================================

/// Arguments of `columns`.
#[derive(Debug, Clone, Default)]
pub struct ColumnChanges {
    pub show: Vec<String>,
    pub hide: Vec<String>,
    pub width: Vec<String>,
    pub moves: Vec<String>,
}

/// Apply layout changes through the store and return the resulting columns.
pub fn update_columns(
    config: &AppConfig,
    settings: &StoreSettings,
    grid: &str,
    changes: &ColumnChanges,
) -> Result<Vec<ledgergrid_core::ColumnDescriptor>, AppError> {
    let definition = catalog(config).get(grid)?;
    let store = open_store(settings)?;
    let mut grid: Grid<Row> = Grid::open(definition, Arc::new(Vec::new()), store)
        .with_min_width(config.grid.min_column_width);

    for key in &changes.show {
        grid.set_visible(key, true)?;
    }
    for key in &changes.hide {
        grid.set_visible(key, false)?;
    }
    for raw in &changes.width {
        let (key, px) = parse_width(raw)?;
        grid.set_width(&key, px)?;
    }
    for raw in &changes.moves {
        match parse_move(raw)? {
            ColumnMove::Positions(from, to) => grid.reorder(from, to)?,
            ColumnMove::Keys(source, target) => grid.move_column(&source, &target)?,
        };
    }
    Ok(grid.columns().to_vec())
}

pub fn cmd_columns(
    config: &AppConfig,
    settings: &StoreSettings,
    json_mode: bool,
    grid: &str,
    changes: &ColumnChanges,
) -> Result<(), AppError> {
    let columns = update_columns(config, settings, grid, changes)?;
    if json_mode {
        return print_json(&columns);
    }
    for (i, column) in columns.iter().enumerate() {
        println!(
            "{:>2}. {:<24} {:>5}px  {}",
            i,
            column.key,
            column.width,
            if column.visible { "visible" } else { "hidden" }
        );
    }
    Ok(())
}

// =============================================================================
// RESET COMMAND
// =============================================================================

pub fn cmd_reset(config: &AppConfig, settings: &StoreSettings, grid: &str) -> Result<(), AppError> {
    let definition = catalog(config).get(grid)?;
    let store = open_store(settings)?;
    let mut grid: Grid<Row> = Grid::open(definition, Arc::new(Vec::new()), store);
    grid.reset_layout();
    println!("Layout of '{}' reset to defaults", grid.definition().name);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> StoreSettings {
        StoreSettings {
            path: PathBuf::from("unused.db"),
            backend: StorageBackend::Memory,
        }
    }

    fn write_rows(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("rows.json");
        std::fs::write(&path, json).expect("write rows");
        path
    }

    #[test]
    fn parses_arguments() {
        let (column, values) = parse_facet("country=GE,AM").expect("facet");
        assert_eq!(column, "country");
        assert_eq!(values.len(), 2);
        assert!(parse_facet("country=").expect("empty facet").1.is_empty());
        assert!(parse_facet("country").is_err());

        assert_eq!(
            parse_sort("amount:desc").expect("sort"),
            ("amount".to_string(), SortDirection::Desc)
        );
        assert_eq!(
            parse_sort("name").expect("sort"),
            ("name".to_string(), SortDirection::Asc)
        );
        assert!(parse_sort("name:sideways").is_err());

        assert_eq!(parse_width("name=180").expect("width"), ("name".to_string(), 180));
        assert!(parse_width("name=wide").is_err());

        assert_eq!(parse_move("0:3").expect("move"), ColumnMove::Positions(0, 3));
        assert_eq!(
            parse_move("name:code").expect("move"),
            ColumnMove::Keys("name".into(), "code".into())
        );
        assert!(parse_move("name").is_err());
    }

    #[test]
    fn load_rows_requires_objects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = write_rows(dir.path(), r#"[{"code":"GE"},{"code":"AM","name":null}]"#);
        assert_eq!(load_rows(&good).expect("rows").len(), 2);

        let bad = write_rows(dir.path(), r#"[{"code":"GE"}, 5]"#);
        assert!(matches!(load_rows(&bad), Err(AppError::InvalidArgument(_))));
        assert!(load_rows(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn view_filters_sorts_and_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows = write_rows(
            dir.path(),
            r#"[
                {"code":"GE","name":"Georgia","is_active":true},
                {"code":"AM","name":"Armenia","is_active":true},
                {"code":"AZ","name":"Azerbaijan","is_active":false}
            ]"#,
        );
        let options = ViewOptions {
            grid: "countries".into(),
            rows,
            filters: FilterArgs {
                search: Some("active".into()),
                ..FilterArgs::default()
            },
            sort: Some("name:desc".into()),
            page: 1,
            page_size: Some(10),
            viewport: None,
        };
        let view = build_view(&AppConfig::default(), &memory_settings(), &options).expect("view");
        // "active" matches both tokens: "active" and "inactive".
        assert_eq!(view.page.total_rows, 3);
        let codes: Vec<_> = view.rows.iter().map(|r| r.cells[0].to_string()).collect();
        assert_eq!(codes, vec!["GE", "AZ", "AM"]);

        let table = render_table(&view);
        assert!(table.starts_with("Code"));
        assert!(table.contains("Name ↓"));
        assert!(table.contains("Page 1 of 1 (3 rows)"));
    }

    #[test]
    fn facets_exclude_own_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows = write_rows(
            dir.path(),
            r#"[
                {"payment_id":"P1","currency":"USD","status":"paid"},
                {"payment_id":"P2","currency":"EUR","status":"open"},
                {"payment_id":"P3","currency":"GEL","status":"paid"}
            ]"#,
        );
        let filters = FilterArgs {
            facets: vec!["currency=USD".into(), "status=paid".into()],
            ..FilterArgs::default()
        };
        let options = facet_options(
            &AppConfig::default(),
            &memory_settings(),
            "payments",
            "currency",
            &rows,
            &filters,
        )
        .expect("options");
        assert_eq!(options, vec!["GEL", "USD"]);
    }

    #[test]
    fn columns_persist_and_reset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = StoreSettings {
            path: dir.path().join("layouts.db"),
            backend: StorageBackend::Redb,
        };
        let config = AppConfig::default();
        let changes = ColumnChanges {
            hide: vec!["iso3".into()],
            width: vec!["name=10".into()],
            moves: vec!["name:code".into()],
            ..ColumnChanges::default()
        };
        let columns = update_columns(&config, &settings, "countries", &changes).expect("update");
        assert_eq!(columns[0].key, "name");
        assert_eq!(columns[0].width, config.grid.min_column_width);
        assert!(!columns.iter().any(|c| c.key == "iso3" && c.visible));

        // A later invocation sees the persisted layout.
        let again = update_columns(&config, &settings, "countries", &ColumnChanges::default())
            .expect("reload");
        assert_eq!(again, columns);

        cmd_reset(&config, &settings, "countries").expect("reset");
        let reset = update_columns(&config, &settings, "countries", &ColumnChanges::default())
            .expect("reload");
        assert_eq!(reset[0].key, "code");
        assert!(reset.iter().all(|c| c.visible));
    }

    #[test]
    fn unknown_grid_and_column_fail() {
        let config = AppConfig::default();
        let settings = memory_settings();
        assert!(matches!(
            update_columns(&config, &settings, "invoices", &ColumnChanges::default()),
            Err(AppError::Grid(ledgergrid_core::GridError::UnknownGrid(_)))
        ));
        let changes = ColumnChanges {
            show: vec!["nope".into()],
            ..ColumnChanges::default()
        };
        assert!(update_columns(&config, &settings, "countries", &changes).is_err());
    }
}
