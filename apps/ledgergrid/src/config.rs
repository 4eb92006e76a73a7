//! # Configuration
//!
//! Optional TOML configuration file. Every section and field is optional;
//! anything left out takes the built-in default.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! rate_limit = 100        # requests/second per session, 0 disables
//! api_key = "..."         # optional; required on session routes when set
//!
//! [storage]
//! path = "ledgergrid.db"
//! backend = "redb"        # or "memory"
//!
//! [grid]
//! default_page_size = 50
//! min_column_width = 40
//!
//! [logging]
//! format = "text"         # or "json"
//! ```
//!
//! Command-line flags override the file. Environment overrides:
//! `LEDGERGRID_API_KEY` and `LEDGERGRID_RATE_LIMIT` for `[server]`,
//! `LEDGERGRID_LOG_FORMAT` for `[logging] format`.

use crate::error::AppError;
use ledgergrid_core::StorageBackend;
use ledgergrid_core::primitives::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_COLUMN_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ledgergrid.toml";

/// Requests per second each session may issue.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-session requests per second; 0 disables limiting.
    pub rate_limit: u32,
    /// Bearer key for everything but the public catalog routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: DEFAULT_RATE_LIMIT,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ledgergrid.db"),
            backend: StorageBackend::Redb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Page size for grids whose definition does not pick one.
    pub default_page_size: usize,
    pub min_column_width: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            min_column_width: MIN_COLUMN_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub grid: GridConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let config: Self = toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`]
    /// is read when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let mut config = if !required && !path.exists() {
            Self::default()
        } else {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                AppError::Config(format!("cannot read '{}': {}", path.display(), e))
            })?;
            let config = Self::parse(&text)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            config
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `LEDGERGRID_API_KEY` and `LEDGERGRID_RATE_LIMIT` as returned by
    /// `lookup`. An empty key removes the configured one.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AppError> {
        if let Some(key) = lookup("LEDGERGRID_API_KEY") {
            self.server.api_key = Some(key);
        }
        if let Some(raw) = lookup("LEDGERGRID_RATE_LIMIT") {
            self.server.rate_limit = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("LEDGERGRID_RATE_LIMIT is not a number: '{raw}'"))
            })?;
        }
        self.server.api_key = self.server.api_key.take().filter(|k| !k.is_empty());
        Ok(())
    }

    fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.grid.default_page_size) {
            return Err(AppError::Config(format!(
                "grid.default_page_size must be within 1..={MAX_PAGE_SIZE}, got {}",
                self.grid.default_page_size
            )));
        }
        if self.grid.min_column_width == 0 {
            return Err(AppError::Config(
                "grid.min_column_width must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
