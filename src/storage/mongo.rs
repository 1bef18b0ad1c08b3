//! MongoDB backend adapter.

use crate::config::StorageConfig;
use crate::storage::backend::{BackendKind, Connector};
use crate::storage::error::StorageError;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

/// The live document store handle.
///
/// Carries both the client (for lifecycle and liveness probes) and the
/// configured database (what data-layer code actually works against).
#[derive(Debug, Clone)]
pub struct MongoHandle {
    /// The driver client.
    pub client: Client,
    /// The configured database.
    pub database: Database,
}

/// Adapter for the document store.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoConnector;

impl MongoConnector {
    async fn client_options(config: &StorageConfig) -> Result<ClientOptions, StorageError> {
        let mongo = &config.mongo;
        let mut options = ClientOptions::parse(&mongo.uri)
            .await
            .map_err(|e| StorageError::connect(BackendKind::Mongo, e))?;
        options.max_pool_size = Some(mongo.max_pool_size);
        Ok(options)
    }
}

impl Connector for MongoConnector {
    type Handle = MongoHandle;

    fn kind(&self) -> BackendKind {
        BackendKind::Mongo
    }

    async fn connect(&self, config: &StorageConfig) -> Result<MongoHandle, StorageError> {
        let mongo = &config.mongo;
        let options = Self::client_options(config).await?;

        let client = Client::with_options(options)
            .map_err(|e| StorageError::connect(BackendKind::Mongo, e))?;

        // The driver connects lazily; ping before publishing the handle,
        // and shut the client down again if the server is unreachable.
        if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(StorageError::connect(BackendKind::Mongo, e));
        }

        let database = client.database(&mongo.database);
        Ok(MongoHandle { client, database })
    }

    async fn close(&self, handle: MongoHandle) -> Result<(), StorageError> {
        handle.client.shutdown().await;
        Ok(())
    }

    async fn is_connected(&self, handle: &MongoHandle) -> bool {
        handle
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }
}
