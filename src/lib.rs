//! # Chassis
//!
//! An async service bootstrap with managed storage backend connections.
//!
//! Chassis loads a configuration snapshot, sets up a structured logger,
//! wires an HTTP server, and manages connections to zero or more storage
//! backends (PostgreSQL, MongoDB, Redis). The storage layer is built around
//! a connection lifecycle manager that starts all enabled backends
//! concurrently, caches established handles for reuse, connects lazily on
//! first use, and tears everything down on shutdown while aggregating
//! partial failures.
//!
//! ## Example
//!
//! ```rust,ignore
//! use chassis::config::AppConfig;
//! use chassis::storage::StorageManager;
//! use std::sync::Arc;
//!
//! let config = Arc::new(AppConfig::load(path)?);
//! let storage = Arc::new(StorageManager::new(config.clone()));
//! storage.init().await?;
//! let pool = storage.postgres().await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod observability;
pub mod repository;
pub mod server;
pub mod storage;

// Re-exports for convenience
pub use config::{AppConfig, Environment, ServerConfig, StorageConfig};
pub use repository::Repository;
pub use storage::{AggregateError, BackendKind, StorageError, StorageManager};

/// Error type for bootstrap-surface operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations. Storage-level failures have their own taxonomy in
/// [`storage::StorageError`]; this type covers everything the bootstrap
/// itself can fail at.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    ///
    /// Raised when:
    /// - The configuration file cannot be read or parsed
    /// - An environment override carries an unparseable value
    /// - The configured environment name is unknown
    #[error("configuration error: {cause}")]
    Config {
        /// The underlying cause.
        cause: String,
    },

    /// Logger setup failed.
    ///
    /// Raised when:
    /// - The level filter directive is invalid
    /// - The log file cannot be created
    /// - A global subscriber is already installed
    #[error("logging setup failed: {cause}")]
    Logging {
        /// The underlying cause.
        cause: String,
    },

    /// The HTTP server failed to bind or serve.
    #[error("http server error: {source}")]
    Server {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// One or more storage backends failed during a bulk operation.
    #[error(transparent)]
    Storage(#[from] storage::AggregateError),
}

impl Error {
    /// Builds a configuration error from any displayable cause.
    pub fn config(cause: impl std::fmt::Display) -> Self {
        Self::Config {
            cause: cause.to_string(),
        }
    }

    /// Builds a logging error from any displayable cause.
    pub fn logging(cause: impl std::fmt::Display) -> Self {
        Self::Logging {
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for chassis operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing file");
        assert_eq!(err.to_string(), "configuration error: missing file");

        let err = Error::logging("bad directive");
        assert_eq!(err.to_string(), "logging setup failed: bad directive");
    }
}
