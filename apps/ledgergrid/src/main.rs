//! # ledgergrid - data-grid service
//!
//! The main binary for the ledgergrid engine.
//!
//! This application provides:
//! - HTTP JSON API hosting grid sessions (axum-based)
//! - CLI interface over JSON row files
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  apps/ledgergrid (THE BINARY)                │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │  Dataset hub   │   │
//! │  │  (clap)     │    │   (axum)    │    │  (broadcast)   │   │
//! │  └──────┬──────┘    └──────┬──────┘    └───────┬────────┘   │
//! │         │                  │                   │            │
//! │         └──────────────────┼───────────────────┘            │
//! │                            ▼                                │
//! │                   ┌─────────────────┐                       │
//! │                   │ ledgergrid-core │                       │
//! │                   │  (THE ENGINE)   │                       │
//! │                   └─────────────────┘                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! ledgergrid serve --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! ledgergrid grids
//! ledgergrid view payments-ledger --rows ledger.json --condition 'Due<0' --sort date:desc
//! ledgergrid columns countries --hide iso3 --width name=240
//! ```

use clap::Parser;
use ledgergrid::config::{AppConfig, LogFormat};
use ledgergrid::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    let config = AppConfig::load(cli.config.as_deref());

    // LEDGERGRID_LOG_FORMAT wins over `[logging] format`.
    let json_logs = match std::env::var("LEDGERGRID_LOG_FORMAT") {
        Ok(format) => format == "json",
        Err(_) => config
            .as_ref()
            .is_ok_and(|c| c.logging.format == LogFormat::Json),
    };

    let default_filter = if cli.verbose {
        "ledgergrid=debug,ledgergrid_core=debug,tower_http=debug"
    } else {
        "ledgergrid=info,ledgergrid_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┬─┬─┐  ledgergrid v{}
  ├─┼─┼─┤
  └─┴─┴─┘  search · facet · sort · page
"#,
        env!("CARGO_PKG_VERSION")
    );
}
