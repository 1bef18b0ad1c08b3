//! Storage connection lifecycle manager.
//!
//! The manager owns at most one cached handle per backend kind. Handles are
//! established lazily on first access (or eagerly via [`Manager::init`]),
//! cached for reuse, and discarded on [`Manager::close`]. It is bound to
//! the configuration snapshot given at construction and never observes
//! later configuration changes.
//!
//! State is guarded by a single reader-writer lock covering all kinds
//! together. Cache hits take the shared form; connect and close take the
//! exclusive form, and the lock is held across the attempt so that a handle
//! is only ever published after its connect fully succeeded. Racing first
//! accesses to different kinds serialize on the upgrade path; with three
//! kinds the contention window is small. A per-kind lock would be a direct,
//! low-risk refactor of the same algorithm if that ever matters.

use crate::config::AppConfig;
use crate::storage::backend::{BackendKind, Connector};
use crate::storage::error::{AggregateError, StorageError};
use crate::storage::mongo::MongoConnector;
use crate::storage::postgres::PostgresConnector;
use crate::storage::redis::RedisConnector;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Per-kind cached handles.
struct Slots<P, D, C> {
    postgres: Option<P>,
    mongo: Option<D>,
    redis: Option<C>,
}

impl<P, D, C> Default for Slots<P, D, C> {
    fn default() -> Self {
        Self {
            postgres: None,
            mongo: None,
            redis: None,
        }
    }
}

/// Connection lifecycle manager, generic over the three backend adapters.
///
/// Use the [`StorageManager`] alias for the real drivers; the type
/// parameters exist so the lifecycle logic can be exercised against
/// instrumented adapters in tests.
pub struct Manager<P: Connector, D: Connector, C: Connector> {
    config: Arc<AppConfig>,
    postgres: P,
    mongo: D,
    redis: C,
    slots: RwLock<Slots<P::Handle, D::Handle, C::Handle>>,
}

/// Manager wired to the real PostgreSQL, MongoDB and Redis adapters.
pub type StorageManager = Manager<PostgresConnector, MongoConnector, RedisConnector>;

/// One backend's entry in the health report.
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    /// The backend kind.
    pub kind: BackendKind,
    /// Whether the snapshot enables this backend.
    pub enabled: bool,
    /// Whether a cached handle exists and answers the liveness probe.
    pub connected: bool,
}

impl StorageManager {
    /// Creates a manager bound to the given configuration snapshot.
    ///
    /// No connection is attempted here; backends connect on first access
    /// or during [`Manager::init`].
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_connectors(config, PostgresConnector, MongoConnector, RedisConnector)
    }
}

impl<P: Connector, D: Connector, C: Connector> Manager<P, D, C> {
    /// Creates a manager over explicit adapters.
    #[must_use]
    pub fn with_connectors(config: Arc<AppConfig>, postgres: P, mongo: D, redis: C) -> Self {
        Self {
            config,
            postgres,
            mongo,
            redis,
            slots: RwLock::new(Slots::default()),
        }
    }

    /// The configuration snapshot this manager is bound to.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Connects every enabled backend concurrently.
    ///
    /// Attempts are independent: a failure in one backend neither cancels
    /// nor alters the outcome of the others, and the call waits for every
    /// attempt to finish. Disabled backends are silently skipped.
    /// Successfully connected backends stay cached even when the aggregate
    /// is an error.
    ///
    /// Whether a non-empty aggregate is fatal is the caller's decision,
    /// not the manager's.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregateError`] listing every backend that failed.
    pub async fn init(&self) -> Result<(), AggregateError> {
        let storage = &self.config.storage;
        let (postgres, mongo, redis) = tokio::join!(
            async {
                if storage.postgres.enabled {
                    self.postgres().await.err()
                } else {
                    None
                }
            },
            async {
                if storage.mongo.enabled {
                    self.mongo().await.err()
                } else {
                    None
                }
            },
            async {
                if storage.redis.enabled {
                    self.redis().await.err()
                } else {
                    None
                }
            },
        );

        let failures: Vec<StorageError> =
            [postgres, mongo, redis].into_iter().flatten().collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new("init", failures))
        }
    }

    /// Returns the relational store handle, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotConfigured`] when the backend is
    /// disabled, [`StorageError::ConnectTimeout`] when the attempt exceeds
    /// the snapshot's connect timeout, or [`StorageError::Connect`] on any
    /// other driver failure. A failed attempt leaves the slot empty, so a
    /// later call retries.
    pub async fn postgres(&self) -> Result<P::Handle, StorageError> {
        if !self.config.storage.postgres.enabled {
            return Err(StorageError::NotConfigured {
                kind: BackendKind::Postgres,
            });
        }

        {
            let slots = self.slots.read().await;
            if let Some(handle) = &slots.postgres {
                return Ok(handle.clone());
            }
        }

        let mut slots = self.slots.write().await;
        // A racing call may have populated the slot while we waited for
        // the exclusive lock.
        if let Some(handle) = &slots.postgres {
            return Ok(handle.clone());
        }

        let handle = self.attempt_connect(&self.postgres).await?;
        slots.postgres = Some(handle.clone());
        Ok(handle)
    }

    /// Returns the document store handle, connecting on first use.
    ///
    /// # Errors
    ///
    /// Same contract as [`Manager::postgres`].
    pub async fn mongo(&self) -> Result<D::Handle, StorageError> {
        if !self.config.storage.mongo.enabled {
            return Err(StorageError::NotConfigured {
                kind: BackendKind::Mongo,
            });
        }

        {
            let slots = self.slots.read().await;
            if let Some(handle) = &slots.mongo {
                return Ok(handle.clone());
            }
        }

        let mut slots = self.slots.write().await;
        if let Some(handle) = &slots.mongo {
            return Ok(handle.clone());
        }

        let handle = self.attempt_connect(&self.mongo).await?;
        slots.mongo = Some(handle.clone());
        Ok(handle)
    }

    /// Returns the cache store handle, connecting on first use.
    ///
    /// # Errors
    ///
    /// Same contract as [`Manager::postgres`].
    pub async fn redis(&self) -> Result<C::Handle, StorageError> {
        if !self.config.storage.redis.enabled {
            return Err(StorageError::NotConfigured {
                kind: BackendKind::Redis,
            });
        }

        {
            let slots = self.slots.read().await;
            if let Some(handle) = &slots.redis {
                return Ok(handle.clone());
            }
        }

        let mut slots = self.slots.write().await;
        if let Some(handle) = &slots.redis {
            return Ok(handle.clone());
        }

        let handle = self.attempt_connect(&self.redis).await?;
        slots.redis = Some(handle.clone());
        Ok(handle)
    }

    /// Closes every cached handle, best-effort.
    ///
    /// Kinds are walked in the fixed [`BackendKind::ALL`] order. Each slot
    /// is cleared unconditionally, whether or not the driver's close
    /// succeeded, so close is idempotent and a later accessor call is free
    /// to reconnect. A failure on one backend never prevents attempting
    /// the next.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregateError`] listing every backend whose close
    /// failed. Callers are expected to log and continue shutting down.
    pub async fn close(&self) -> Result<(), AggregateError> {
        let timeout = self.config.storage.shutdown_timeout();
        let mut slots = self.slots.write().await;
        let mut failures = Vec::new();

        if let Some(handle) = slots.postgres.take() {
            if let Err(err) = self.attempt_close(&self.postgres, handle, timeout).await {
                failures.push(err);
            }
        }
        if let Some(handle) = slots.mongo.take() {
            if let Err(err) = self.attempt_close(&self.mongo, handle, timeout).await {
                failures.push(err);
            }
        }
        if let Some(handle) = slots.redis.take() {
            if let Err(err) = self.attempt_close(&self.redis, handle, timeout).await {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new("close", failures))
        }
    }

    /// Reports per-backend health for the external health endpoint.
    ///
    /// Probes only handles that are already cached; it never triggers a
    /// connect. Each probe is bounded by the snapshot's connect timeout.
    pub async fn health(&self) -> Vec<BackendHealth> {
        let timeout = self.config.storage.connect_timeout();
        // Clone the cached handles and release the lock before probing;
        // the probes are network-bound and must not stall writers (or the
        // readers queued behind them).
        let (cached_postgres, cached_mongo, cached_redis) = {
            let slots = self.slots.read().await;
            (
                slots.postgres.clone(),
                slots.mongo.clone(),
                slots.redis.clone(),
            )
        };

        let probe_postgres = async {
            match &cached_postgres {
                Some(handle) => Self::probe(self.postgres.is_connected(handle), timeout).await,
                None => false,
            }
        };
        let probe_mongo = async {
            match &cached_mongo {
                Some(handle) => Self::probe(self.mongo.is_connected(handle), timeout).await,
                None => false,
            }
        };
        let probe_redis = async {
            match &cached_redis {
                Some(handle) => Self::probe(self.redis.is_connected(handle), timeout).await,
                None => false,
            }
        };
        let (postgres, mongo, redis) = tokio::join!(probe_postgres, probe_mongo, probe_redis);

        vec![
            BackendHealth {
                kind: BackendKind::Postgres,
                enabled: self.config.storage.postgres.enabled,
                connected: postgres,
            },
            BackendHealth {
                kind: BackendKind::Mongo,
                enabled: self.config.storage.mongo.enabled,
                connected: mongo,
            },
            BackendHealth {
                kind: BackendKind::Redis,
                enabled: self.config.storage.redis.enabled,
                connected: redis,
            },
        ]
    }

    async fn probe(check: impl Future<Output = bool>, timeout: Duration) -> bool {
        (tokio::time::timeout(timeout, check).await).unwrap_or(false)
    }

    /// Runs one connect attempt bounded by the snapshot's connect timeout.
    ///
    /// Emits one structured event per attempt. Dropping the timed-out
    /// future is the cancellation mechanism; the adapter contract requires
    /// that to be safe.
    async fn attempt_connect<B: Connector>(
        &self,
        connector: &B,
    ) -> Result<B::Handle, StorageError> {
        let timeout = self.config.storage.connect_timeout();
        let kind = connector.kind();
        match tokio::time::timeout(timeout, connector.connect(&self.config.storage)).await {
            Ok(Ok(handle)) => {
                tracing::info!(backend = %kind, "storage connection established");
                Ok(handle)
            }
            Ok(Err(err)) => {
                tracing::warn!(backend = %kind, error = %err, "storage connection failed");
                Err(err)
            }
            Err(_) => {
                let err = StorageError::ConnectTimeout { kind, timeout };
                tracing::warn!(backend = %kind, ?timeout, "storage connection timed out");
                Err(err)
            }
        }
    }

    /// Runs one close attempt bounded by the snapshot's shutdown timeout.
    async fn attempt_close<B: Connector>(
        &self,
        connector: &B,
        handle: B::Handle,
        timeout: Duration,
    ) -> Result<(), StorageError> {
        let kind = connector.kind();
        match tokio::time::timeout(timeout, connector.close(handle)).await {
            Ok(Ok(())) => {
                tracing::info!(backend = %kind, "storage connection closed");
                Ok(())
            }
            Ok(Err(err)) => {
                tracing::error!(backend = %kind, error = %err, "storage close failed");
                Err(err)
            }
            Err(_) => {
                let err = StorageError::CloseTimeout { kind, timeout };
                tracing::error!(backend = %kind, ?timeout, "storage close timed out");
                Err(err)
            }
        }
    }
}
