//! Configuration management.
//!
//! The configuration is an immutable snapshot: it is loaded once at startup
//! (YAML file plus environment overrides) and handed to every component by
//! value or `Arc`. Components never observe later changes through it;
//! reloads are propagated explicitly through [`watch`].

mod environment;
pub mod watch;

pub use environment::Environment;

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default configuration file looked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Top-level configuration snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server and process-level settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server and process-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port the HTTP server listens on.
    #[serde(default = "defaults::port")]
    pub port: u16,
    /// Deployment environment.
    #[serde(default)]
    pub env: Environment,
    /// Seconds the server may take to drain connections on shutdown.
    #[serde(default = "defaults::server_shutdown_secs")]
    pub shutdown_timeout_secs: u64,
    /// Seconds a single request may take end to end.
    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Explicit log level; falls back to an environment-based default.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Log output routing.
    #[serde(default)]
    pub log_output: LogOutputConfig,
}

/// Log output routing.
#[derive(Debug, Clone, Deserialize)]
pub struct LogOutputConfig {
    /// Write log events to stdout.
    #[serde(default = "defaults::enabled")]
    pub console: bool,
    /// Additionally append log events to `logs/chassis.log`.
    #[serde(default)]
    pub file: bool,
}

/// Storage backend settings.
///
/// Each backend carries an `enabled` flag; a disabled backend is never
/// connected and its accessor reports "not configured".
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Seconds a single connect attempt may take.
    #[serde(default = "defaults::connect_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds a single close attempt may take during shutdown.
    #[serde(default = "defaults::storage_shutdown_secs")]
    pub shutdown_timeout_secs: u64,
    /// Relational store.
    #[serde(default)]
    pub postgres: PostgresConfig,
    /// Document store.
    #[serde(default)]
    pub mongo: MongoConfig,
    /// Cache store.
    #[serde(default)]
    pub redis: RedisConfig,
}

/// PostgreSQL connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    /// Whether the backend is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Server hostname.
    #[serde(default = "defaults::localhost")]
    pub host: String,
    /// Server port.
    #[serde(default = "defaults::postgres_port")]
    pub port: u16,
    /// User name.
    #[serde(default)]
    pub user: String,
    /// Password. Redacted from `Debug` output; read it through
    /// [`secrecy::ExposeSecret`].
    #[serde(default = "defaults::empty_secret")]
    pub password: SecretString,
    /// Database name.
    #[serde(default)]
    pub dbname: String,
    /// Maximum connections in the pool.
    #[serde(default = "defaults::pool_size")]
    pub max_pool_size: usize,
}

/// MongoDB connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    /// Whether the backend is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Connection URI.
    #[serde(default = "defaults::mongo_uri")]
    pub uri: String,
    /// Database name.
    #[serde(default)]
    pub database: String,
    /// Maximum connections in the driver pool.
    #[serde(default = "defaults::mongo_pool_size")]
    pub max_pool_size: u32,
}

/// Redis connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Whether the backend is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Server hostname.
    #[serde(default = "defaults::localhost")]
    pub host: String,
    /// Server port.
    #[serde(default = "defaults::redis_port")]
    pub port: u16,
    /// Password, if the server requires one. Redacted from `Debug` output.
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Logical database index.
    #[serde(default)]
    pub db: i64,
}

mod defaults {
    pub const fn port() -> u16 {
        8080
    }
    pub const fn server_shutdown_secs() -> u64 {
        30
    }
    pub const fn request_timeout_secs() -> u64 {
        30
    }
    pub const fn connect_secs() -> u64 {
        15
    }
    pub const fn storage_shutdown_secs() -> u64 {
        30
    }
    pub const fn enabled() -> bool {
        true
    }
    pub fn localhost() -> String {
        "localhost".to_string()
    }
    pub const fn postgres_port() -> u16 {
        5432
    }
    pub const fn redis_port() -> u16 {
        6379
    }
    pub const fn pool_size() -> usize {
        20
    }
    pub fn mongo_uri() -> String {
        "mongodb://localhost:27017".to_string()
    }
    pub fn empty_secret() -> super::SecretString {
        super::SecretString::from("")
    }
    pub const fn mongo_pool_size() -> u32 {
        16
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            env: Environment::default(),
            shutdown_timeout_secs: defaults::server_shutdown_secs(),
            request_timeout_secs: defaults::request_timeout_secs(),
            log_level: None,
            log_output: LogOutputConfig::default(),
        }
    }
}

impl Default for LogOutputConfig {
    fn default() -> Self {
        Self {
            console: true,
            file: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: defaults::connect_secs(),
            shutdown_timeout_secs: defaults::storage_shutdown_secs(),
            postgres: PostgresConfig::default(),
            mongo: MongoConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: defaults::localhost(),
            port: defaults::postgres_port(),
            user: String::new(),
            password: defaults::empty_secret(),
            dbname: String::new(),
            max_pool_size: defaults::pool_size(),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            uri: defaults::mongo_uri(),
            database: String::new(),
            max_pool_size: defaults::mongo_pool_size(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: defaults::localhost(),
            port: defaults::redis_port(),
            password: None,
            db: 0,
        }
    }
}

impl ServerConfig {
    /// Deadline for draining HTTP connections on shutdown.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Deadline for a single HTTP request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageConfig {
    /// Deadline for a single backend connect attempt.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Deadline for a single backend close attempt.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl AppConfig {
    /// Loads configuration from a YAML file and applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// environment override carries an unparseable value.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("cannot read {}: {e}", path.display()))
        })?;

        let mut config: Self = serde_yaml_ng::from_str(&contents).map_err(|e| {
            crate::Error::config(format!("cannot parse {}: {e}", path.display()))
        })?;

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Loads configuration from the default location.
    ///
    /// Reads [`DEFAULT_CONFIG_PATH`] if it exists; otherwise starts from
    /// defaults. Environment overrides are applied either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if an
    /// environment override carries an unparseable value.
    pub fn load_default() -> crate::Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            return Self::load(path);
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applies `CHASSIS_*` environment variable overrides.
    ///
    /// Only the knobs that routinely differ between deployments are
    /// overridable; everything else belongs in the file.
    fn apply_env_overrides(&mut self) -> crate::Result<()> {
        if let Ok(port) = std::env::var("CHASSIS_SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| crate::Error::config(format!("CHASSIS_SERVER_PORT: {e}")))?;
        }
        if let Ok(env) = std::env::var("CHASSIS_ENV") {
            self.server.env = env.parse()?;
        }
        if let Ok(level) = std::env::var("CHASSIS_LOG_LEVEL") {
            self.server.log_level = Some(level);
        }
        if let Ok(password) = std::env::var("CHASSIS_POSTGRES_PASSWORD") {
            self.storage.postgres.password = SecretString::from(password);
        }
        if let Ok(uri) = std::env::var("CHASSIS_MONGO_URI") {
            self.storage.mongo.uri = uri;
        }
        if let Ok(password) = std::env::var("CHASSIS_REDIS_PASSWORD") {
            self.storage.redis.password = Some(SecretString::from(password));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.env.is_development());
        assert_eq!(config.storage.connect_timeout(), Duration::from_secs(15));
        assert_eq!(config.storage.shutdown_timeout(), Duration::from_secs(30));
        assert!(!config.storage.postgres.enabled);
        assert!(!config.storage.mongo.enabled);
        assert!(!config.storage.redis.enabled);
        assert!(config.server.log_output.console);
        assert!(!config.server.log_output.file);
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r"
server:
  port: 9090
  env: staging
  log_level: debug
storage:
  connect_timeout_secs: 5
  postgres:
    enabled: true
    host: db.internal
    user: app
    password: secret
    dbname: app
  redis:
    enabled: true
    host: cache.internal
    db: 3
",
        );

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert!(config.server.env.is_staging());
        assert_eq!(config.server.log_level.as_deref(), Some("debug"));
        assert_eq!(config.storage.connect_timeout(), Duration::from_secs(5));
        assert!(config.storage.postgres.enabled);
        assert_eq!(config.storage.postgres.host, "db.internal");
        assert_eq!(config.storage.postgres.port, 5432);
        assert!(!config.storage.mongo.enabled);
        assert!(config.storage.redis.enabled);
        assert_eq!(config.storage.redis.db, 3);
    }

    #[test]
    fn test_passwords_are_redacted_from_debug() {
        use secrecy::ExposeSecret;

        let file = write_config(
            r"
storage:
  postgres:
    password: hunter2
  redis:
    password: hunter2
",
        );

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.storage.postgres.password.expose_secret(), "hunter2");

        let dump = format!("{config:?}");
        assert!(!dump.contains("hunter2"));
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let file = write_config("{}");
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(!config.storage.postgres.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/chassis.yaml")).unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let file = write_config("server: [not, a, mapping]");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("cannot parse"));
    }

    #[test]
    fn test_load_rejects_unknown_environment() {
        let file = write_config("server:\n  env: prod\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }
}
