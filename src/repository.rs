//! Data-layer accessor facade.
//!
//! Repositories embed this type and reach their backend through it instead
//! of holding driver handles directly; every access goes through the
//! manager, so a repository transparently benefits from lazy connection
//! and reconnection after close.

use crate::storage::{MongoHandle, PostgresHandle, RedisHandle, StorageError, StorageManager};
use std::sync::Arc;

/// Shared accessor facade over the storage manager.
#[derive(Clone)]
pub struct Repository {
    storage: Arc<StorageManager>,
}

impl Repository {
    /// Creates a facade over the given manager.
    #[must_use]
    pub const fn new(storage: Arc<StorageManager>) -> Self {
        Self { storage }
    }

    /// The relational store pool.
    ///
    /// # Errors
    ///
    /// Propagates the manager's accessor errors (not configured, connect
    /// failure, connect timeout).
    pub async fn postgres(&self) -> Result<PostgresHandle, StorageError> {
        self.storage.postgres().await
    }

    /// The configured document store database.
    ///
    /// # Errors
    ///
    /// Propagates the manager's accessor errors.
    pub async fn mongo(&self) -> Result<mongodb::Database, StorageError> {
        let handle: MongoHandle = self.storage.mongo().await?;
        Ok(handle.database)
    }

    /// The cache store connection.
    ///
    /// # Errors
    ///
    /// Propagates the manager's accessor errors.
    pub async fn redis(&self) -> Result<RedisHandle, StorageError> {
        self.storage.redis().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::{BackendKind, StorageError};

    #[tokio::test]
    async fn test_disabled_backends_surface_not_configured() {
        let config = Arc::new(AppConfig::default());
        let repository = Repository::new(Arc::new(StorageManager::new(config)));

        let err = repository.postgres().await.unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured { kind } if kind == BackendKind::Postgres));
        let err = repository.mongo().await.unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured { kind } if kind == BackendKind::Mongo));
        let err = repository.redis().await.unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured { kind } if kind == BackendKind::Redis));
    }
}
