//! Storage error taxonomy.
//!
//! The manager classifies and aggregates; it never decides fatality. Bulk
//! operations (`init`, `close`) return an [`AggregateError`] labeling every
//! per-backend failure, and the caller chooses whether that is fatal.

use crate::storage::BackendKind;
use std::fmt;
use std::time::Duration;
use thiserror::Error as ThisError;

/// Boxed driver error carried as the cause of a storage failure.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single backend's failure, labeled by kind.
#[derive(Debug, ThisError)]
pub enum StorageError {
    /// The backend is disabled in the configuration snapshot.
    ///
    /// A normal negative result, not a failure: disabled backends are
    /// permanently excluded from caching and never attempted.
    #[error("{kind} is not configured")]
    NotConfigured {
        /// The backend kind.
        kind: BackendKind,
    },

    /// The driver failed while establishing or probing the connection.
    #[error("{kind} connection failed: {source}")]
    Connect {
        /// The backend kind.
        kind: BackendKind,
        /// The underlying driver error.
        #[source]
        source: DriverError,
    },

    /// The connect attempt did not finish within the configured deadline.
    ///
    /// Distinguished from [`StorageError::Connect`] because callers
    /// typically escalate it differently, reporting the configured timeout.
    #[error("{kind} connection timed out after {timeout:?}")]
    ConnectTimeout {
        /// The backend kind.
        kind: BackendKind,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The driver failed while releasing the backend's resources.
    ///
    /// Always non-fatal to the shutdown sequence.
    #[error("{kind} close failed: {source}")]
    Close {
        /// The backend kind.
        kind: BackendKind,
        /// The underlying driver error.
        #[source]
        source: DriverError,
    },

    /// The close attempt did not finish within the configured deadline.
    #[error("{kind} close timed out after {timeout:?}")]
    CloseTimeout {
        /// The backend kind.
        kind: BackendKind,
        /// The deadline that elapsed.
        timeout: Duration,
    },
}

impl StorageError {
    /// Builds a connect failure from any driver error.
    pub fn connect(kind: BackendKind, source: impl Into<DriverError>) -> Self {
        Self::Connect {
            kind,
            source: source.into(),
        }
    }

    /// Builds a close failure from any driver error.
    pub fn close(kind: BackendKind, source: impl Into<DriverError>) -> Self {
        Self::Close {
            kind,
            source: source.into(),
        }
    }

    /// The backend kind this error is labeled with.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::NotConfigured { kind }
            | Self::Connect { kind, .. }
            | Self::ConnectTimeout { kind, .. }
            | Self::Close { kind, .. }
            | Self::CloseTimeout { kind, .. } => *kind,
        }
    }

    /// Whether this failure was a deadline elapsing.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. } | Self::CloseTimeout { .. })
    }
}

/// Composite error from one bulk operation (`init` or `close`).
///
/// Wraps one or more per-backend failures; a bulk operation with no
/// failures returns `Ok(())` instead of an empty aggregate.
#[derive(Debug)]
pub struct AggregateError {
    operation: &'static str,
    failures: Vec<StorageError>,
}

impl AggregateError {
    /// Wraps the collected failures of the named bulk operation.
    ///
    /// # Panics
    ///
    /// Panics if `failures` is empty; an empty aggregate is a logic error
    /// in the manager.
    #[must_use]
    pub fn new(operation: &'static str, failures: Vec<StorageError>) -> Self {
        assert!(!failures.is_empty(), "aggregate of zero failures");
        Self {
            operation,
            failures,
        }
    }

    /// The bulk operation that produced this aggregate.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        self.operation
    }

    /// The per-backend failures, in close order for `close` and in no
    /// promised order for `init`.
    #[must_use]
    pub fn failures(&self) -> &[StorageError] {
        &self.failures
    }

    /// Whether any backend's failure was a deadline elapsing.
    #[must_use]
    pub fn any_timeout(&self) -> bool {
        self.failures.iter().any(StorageError::is_timeout)
    }

    /// Whether the aggregate contains a failure for the given kind.
    #[must_use]
    pub fn contains(&self, kind: BackendKind) -> bool {
        self.failures.iter().any(|err| err.kind() == kind)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "storage {} failed for {} backend(s): ",
            self.operation,
            self.failures.len()
        )?;
        for (i, err) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::NotConfigured {
            kind: BackendKind::Mongo,
        };
        assert_eq!(err.to_string(), "mongo is not configured");

        let err = StorageError::connect(BackendKind::Postgres, "connection refused");
        assert_eq!(
            err.to_string(),
            "postgres connection failed: connection refused"
        );

        let err = StorageError::ConnectTimeout {
            kind: BackendKind::Redis,
            timeout: Duration::from_secs(15),
        };
        assert!(err.to_string().contains("timed out"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(
            StorageError::close(BackendKind::Redis, "broken pipe").kind(),
            BackendKind::Redis
        );
        assert!(!StorageError::connect(BackendKind::Mongo, "refused").is_timeout());
    }

    #[test]
    fn test_aggregate_display_and_queries() {
        let agg = AggregateError::new(
            "init",
            vec![
                StorageError::ConnectTimeout {
                    kind: BackendKind::Postgres,
                    timeout: Duration::from_secs(5),
                },
                StorageError::connect(BackendKind::Redis, "connection refused"),
            ],
        );

        let display = agg.to_string();
        assert!(display.contains("storage init failed for 2 backend(s)"));
        assert!(display.contains("postgres"));
        assert!(display.contains("redis"));

        assert!(agg.any_timeout());
        assert!(agg.contains(BackendKind::Postgres));
        assert!(agg.contains(BackendKind::Redis));
        assert!(!agg.contains(BackendKind::Mongo));
    }

    #[test]
    #[should_panic(expected = "aggregate of zero failures")]
    fn test_aggregate_rejects_empty() {
        let _ = AggregateError::new("close", Vec::new());
    }
}
