//! Backend kinds and the adapter capability set.

use crate::config::StorageConfig;
use crate::storage::StorageError;
use serde::Serialize;
use std::fmt;

/// The storage technologies the manager coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Relational store (PostgreSQL).
    Postgres,
    /// Document store (MongoDB).
    Mongo,
    /// Cache store (Redis).
    Redis,
}

impl BackendKind {
    /// All kinds, in the fixed order `close` walks them.
    ///
    /// The order exists for deterministic logging only; no correctness
    /// property depends on it.
    pub const ALL: [Self; 3] = [Self::Postgres, Self::Mongo, Self::Redis];

    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mongo => "mongo",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability set every storage technology implements.
///
/// The manager's logic is written entirely against this contract; a new
/// backend kind integrates by providing `connect`, `close` and
/// `is_connected` over its driver.
///
/// Every method is bounded by the caller through [`tokio::time::timeout`];
/// implementations must stay cancel-safe, which in practice means doing all
/// network work inside the returned future and leaving no half-registered
/// global state behind when it is dropped.
#[allow(async_fn_in_trait)]
pub trait Connector: Send + Sync {
    /// The live, connected client for this backend.
    ///
    /// Handles are cheap to clone: every clone shares the same underlying
    /// pool or multiplexed connection, so handing out clones preserves the
    /// one-live-connection-per-kind invariant.
    type Handle: Clone + Send + Sync + 'static;

    /// The kind this connector serves.
    fn kind(&self) -> BackendKind;

    /// Establishes a live client and verifies liveness with one round-trip
    /// probe before returning success.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError::Connect`] when the driver or the probe
    /// fails.
    async fn connect(&self, config: &StorageConfig) -> Result<Self::Handle, StorageError>;

    /// Releases all resources held by the handle.
    ///
    /// The manager discards the handle before calling this, so an
    /// implementation is never asked to close the same handle twice.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError::Close`] when the driver fails to release
    /// its resources.
    async fn close(&self, handle: Self::Handle) -> Result<(), StorageError>;

    /// Non-mutating liveness probe.
    ///
    /// Used by external health checks, never by the manager's own logic.
    async fn is_connected(&self, handle: &Self::Handle) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_order_is_fixed() {
        assert_eq!(
            BackendKind::ALL,
            [BackendKind::Postgres, BackendKind::Mongo, BackendKind::Redis]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(BackendKind::Postgres.to_string(), "postgres");
        assert_eq!(BackendKind::Mongo.to_string(), "mongo");
        assert_eq!(BackendKind::Redis.to_string(), "redis");
    }
}
