//! Redis backend adapter.
//!
//! Wraps the driver's tokio [`ConnectionManager`], a cloneable multiplexed
//! connection that reconnects on its own when the link drops.

use crate::config::StorageConfig;
use crate::storage::backend::{BackendKind, Connector};
use crate::storage::error::StorageError;
use redis::aio::ConnectionManager;
use secrecy::ExposeSecret;

/// The live cache store handle: a multiplexed connection.
pub type RedisHandle = ConnectionManager;

/// Adapter for the cache store.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    fn connection_url(config: &StorageConfig) -> String {
        let redis = &config.redis;
        match &redis.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password.expose_secret(),
                redis.host,
                redis.port,
                redis.db
            ),
            None => format!("redis://{}:{}/{}", redis.host, redis.port, redis.db),
        }
    }
}

impl Connector for RedisConnector {
    type Handle = RedisHandle;

    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    async fn connect(&self, config: &StorageConfig) -> Result<RedisHandle, StorageError> {
        let client = redis::Client::open(Self::connection_url(config))
            .map_err(|e| StorageError::connect(BackendKind::Redis, e))?;

        let mut manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StorageError::connect(BackendKind::Redis, e))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut manager)
            .await
            .map_err(|e| StorageError::connect(BackendKind::Redis, e))?;

        Ok(manager)
    }

    async fn close(&self, handle: RedisHandle) -> Result<(), StorageError> {
        // The multiplexed connection has no explicit close; dropping the
        // last clone tears down the link and its driver task.
        drop(handle);
        Ok(())
    }

    async fn is_connected(&self, handle: &RedisHandle) -> bool {
        let mut conn = handle.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use secrecy::SecretString;

    #[test]
    fn test_connection_url_from_config() {
        let mut config = AppConfig::default().storage;
        config.redis.host = "cache.internal".to_string();
        config.redis.port = 6380;
        config.redis.db = 3;

        assert_eq!(
            RedisConnector::connection_url(&config),
            "redis://cache.internal:6380/3"
        );

        config.redis.password = Some(SecretString::from("hunter2"));
        let url = RedisConnector::connection_url(&config);
        assert_eq!(url, "redis://:hunter2@cache.internal:6380/3");

        // The driver parses what we build; open() does not connect.
        redis::Client::open(url).unwrap();
    }
}
