//! Storage layer.
//!
//! A connection lifecycle manager over three backend adapters:
//! - **Postgres**: relational store (`deadpool-postgres` pool)
//! - **Mongo**: document store (`mongodb` driver)
//! - **Redis**: cache store (`redis` tokio connection manager)
//!
//! The manager caches at most one live handle per kind, connects enabled
//! backends concurrently at startup or lazily on first use, and tears
//! everything down best-effort on shutdown. Adapters integrate through the
//! [`Connector`] capability set; the manager's logic never names a
//! concrete driver.

pub mod backend;
pub mod error;
pub mod manager;
pub mod mongo;
pub mod postgres;
pub mod redis;

pub use backend::{BackendKind, Connector};
pub use error::{AggregateError, DriverError, StorageError};
pub use manager::{BackendHealth, Manager, StorageManager};
pub use mongo::{MongoConnector, MongoHandle};
pub use postgres::{PostgresConnector, PostgresHandle};
pub use redis::{RedisConnector, RedisHandle};
