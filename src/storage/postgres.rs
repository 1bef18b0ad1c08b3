//! PostgreSQL backend adapter.
//!
//! Wraps a `deadpool-postgres` pool. Pooling internals (sizing, acquire
//! timeouts, recycling) are the pool's concern; the adapter only builds
//! the pool, verifies liveness with one round-trip query, and shuts the
//! pool down on close.

use crate::config::StorageConfig;
use crate::storage::backend::{BackendKind, Connector};
use crate::storage::error::StorageError;
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use secrecy::ExposeSecret;
use tokio_postgres::NoTls;

/// The live relational store handle: a shared connection pool.
pub type PostgresHandle = Pool;

/// Adapter for the relational store.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

impl PostgresConnector {
    fn build_pool(config: &StorageConfig) -> Result<Pool, StorageError> {
        let pg = &config.postgres;
        let mut cfg = Config::new();
        cfg.host = Some(pg.host.clone());
        cfg.port = Some(pg.port);
        cfg.user = Some(pg.user.clone());
        cfg.password = Some(pg.password.expose_secret().to_string());
        cfg.dbname = Some(pg.dbname.clone());
        cfg.application_name = Some(env!("CARGO_PKG_NAME").to_string());
        cfg.pool = Some(PoolConfig::new(pg.max_pool_size));

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::connect(BackendKind::Postgres, e))
    }
}

impl Connector for PostgresConnector {
    type Handle = PostgresHandle;

    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn connect(&self, config: &StorageConfig) -> Result<PostgresHandle, StorageError> {
        let pool = Self::build_pool(config)?;

        // Pool creation is lazy; one round-trip proves the server is
        // actually reachable before the handle is published.
        let client = pool
            .get()
            .await
            .map_err(|e| StorageError::connect(BackendKind::Postgres, e))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| StorageError::connect(BackendKind::Postgres, e))?;

        Ok(pool)
    }

    async fn close(&self, handle: PostgresHandle) -> Result<(), StorageError> {
        handle.close();
        Ok(())
    }

    async fn is_connected(&self, handle: &PostgresHandle) -> bool {
        match handle.get().await {
            Ok(client) => client.simple_query("SELECT 1").await.is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_build_pool_from_config() {
        let mut config = AppConfig::default().storage;
        config.postgres.host = "db.internal".to_string();
        config.postgres.user = "app".to_string();
        config.postgres.dbname = "app".to_string();
        config.postgres.max_pool_size = 4;

        // Creation succeeds without a reachable server; only connect()
        // performs the liveness probe.
        let pool = PostgresConnector::build_pool(&config).unwrap();
        assert_eq!(pool.status().max_size, 4);
    }
}
