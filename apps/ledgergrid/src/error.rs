//! # Application Errors
//!
//! Everything the CLI and the HTTP service can fail with. Engine errors are
//! wrapped unchanged; the rest are configuration, file and argument problems
//! the engine never sees.

use ledgergrid_core::GridError;
use thiserror::Error;

/// Errors surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// An engine operation failed.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file or socket operation failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A command-line or request argument is malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No open session has this id.
    #[error("Unknown session: {0}")]
    UnknownSession(u64),

    /// The request carries no API key, or the wrong one.
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    /// The request quota is spent for now.
    #[error("Too many requests")]
    RateLimited,
}
