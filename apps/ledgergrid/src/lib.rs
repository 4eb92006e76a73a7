//! # ledgergrid
//!
//! The application around `ledgergrid-core`: the grid catalog of the
//! business screens, the dataset refresh hub, the HTTP session service and
//! the CLI.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod hub;
pub mod session;

pub use catalog::Catalog;
pub use config::AppConfig;
pub use error::AppError;
