//! # ledgergrid CLI Module
//!
//! This module implements the CLI interface for ledgergrid.
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `grids` - List the grid catalog
//! - `view` - Render one page of a grid over a JSON row file
//! - `facets` - List reachable facet options of a column
//! - `columns` - Inspect or change the persisted column layout
//! - `reset` - Remove the persisted layout of a grid

mod commands;

use crate::config::AppConfig;
use crate::error::AppError;
use clap::{Args, Parser, Subcommand};
use ledgergrid_core::StorageBackend;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ledgergrid - interactive data grids for business tables
///
/// Search, facet, sort and page tabular records with per-grid persisted
/// column layouts.
#[derive(Parser, Debug)]
#[command(name = "ledgergrid")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the layout store (overrides `[storage] path`)
    #[arg(short = 'S', long, global = true)]
    pub store: Option<PathBuf>,

    /// Layout store backend: "redb" or "memory" (overrides `[storage] backend`)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Configuration file (default: ledgergrid.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Search, facet and condition flags shared by `view` and `facets`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Free-text search term
    #[arg(short, long)]
    pub search: Option<String>,

    /// Facet selection as `column=value1,value2` (repeatable)
    #[arg(long = "facet")]
    pub facets: Vec<String>,

    /// Named condition to select, e.g. `Due<0` (repeatable, OR-combined)
    #[arg(long = "condition")]
    pub conditions: Vec<String>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to (overrides `[server] host`)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides `[server] port`)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the grid catalog
    Grids,

    /// Render one page of a grid
    View {
        /// Grid name (see `grids`)
        grid: String,

        /// JSON file holding an array of row objects
        #[arg(short, long)]
        rows: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Sort as `column` or `column:desc`
        #[arg(long)]
        sort: Option<String>,

        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: usize,

        /// Rows per page
        #[arg(long)]
        page_size: Option<usize>,

        /// Viewport width in px for responsive columns
        #[arg(long)]
        viewport: Option<u32>,
    },

    /// List the facet options reachable for a column
    Facets {
        /// Grid name
        grid: String,

        /// Column key
        column: String,

        /// JSON file holding an array of row objects
        #[arg(short, long)]
        rows: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Inspect or change the persisted column layout
    Columns {
        /// Grid name
        grid: String,

        /// Show a column (repeatable)
        #[arg(long)]
        show: Vec<String>,

        /// Hide a column (repeatable)
        #[arg(long)]
        hide: Vec<String>,

        /// Set a width as `column=px` (repeatable)
        #[arg(long)]
        width: Vec<String>,

        /// Move a column as `source:target` (keys or positions, repeatable)
        #[arg(long = "move")]
        moves: Vec<String>,
    },

    /// Remove the persisted layout of a grid
    Reset {
        /// Grid name
        grid: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolved storage settings: flags first, then the configuration file.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub path: PathBuf,
    pub backend: StorageBackend,
}

impl StoreSettings {
    pub fn resolve(cli: &Cli, config: &AppConfig) -> Result<Self, AppError> {
        let backend = match cli.backend.as_deref() {
            Some(name) => name.parse::<StorageBackend>()?,
            None => config.storage.backend,
        };
        Ok(Self {
            path: cli.store.clone().unwrap_or_else(|| config.storage.path.clone()),
            backend,
        })
    }
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli, config: AppConfig) -> Result<(), AppError> {
    let store = StoreSettings::resolve(&cli, &config)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            cmd_serve(&config, &store, &host, port).await
        }
        Some(Commands::View {
            grid,
            rows,
            filters,
            sort,
            page,
            page_size,
            viewport,
        }) => cmd_view(
            &config,
            &store,
            json_mode,
            &ViewOptions {
                grid,
                rows,
                filters,
                sort,
                page,
                page_size,
                viewport,
            },
        ),
        Some(Commands::Facets {
            grid,
            column,
            rows,
            filters,
        }) => cmd_facets(&config, &store, json_mode, &grid, &column, &rows, &filters),
        Some(Commands::Columns {
            grid,
            show,
            hide,
            width,
            moves,
        }) => cmd_columns(
            &config,
            &store,
            json_mode,
            &grid,
            &ColumnChanges {
                show,
                hide,
                width,
                moves,
            },
        ),
        Some(Commands::Reset { grid }) => cmd_reset(&config, &store, &grid),
        Some(Commands::Grids) | None => cmd_grids(&config, json_mode),
    }
}
