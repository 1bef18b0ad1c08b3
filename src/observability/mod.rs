//! Observability: structured logger setup.
//!
//! The subscriber is constructed explicitly at process start and returns a
//! [`LogHandle`]; components that need to adjust the level later (the
//! configuration reload path) get the handle injected rather than reaching
//! for a global. Output format follows the environment: JSON in production
//! and staging, human-readable elsewhere. An optional file sink appends to
//! `logs/chassis.log` alongside stdout.

use crate::config::AppConfig;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "chassis.log";

/// Handle to the installed subscriber's reloadable level filter.
#[derive(Clone)]
pub struct LogHandle {
    reload: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Replaces the level filter with the given directive.
    ///
    /// # Errors
    ///
    /// Returns an error if the directive is invalid or the subscriber has
    /// been dropped.
    pub fn set_level(&self, level: &str) -> crate::Result<()> {
        let filter = EnvFilter::try_new(level).map_err(crate::Error::logging)?;
        self.reload.reload(filter).map_err(crate::Error::logging)
    }

    /// Re-resolves the level from a fresh configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot carries an invalid level directive.
    pub fn update_from(&self, config: &AppConfig) -> crate::Result<()> {
        self.set_level(&resolve_level(config, None))
    }
}

/// Resolves the active level directive.
///
/// Precedence: explicit override (CLI flag) > configured `log_level` >
/// environment-based default (production/staging warn, testing info,
/// development debug).
#[must_use]
pub fn resolve_level(config: &AppConfig, override_level: Option<&str>) -> String {
    if let Some(level) = override_level {
        return level.to_string();
    }
    if let Some(level) = &config.server.log_level {
        return level.clone();
    }

    let env = config.server.env;
    if env.is_production() || env.is_staging() {
        "warn".to_string()
    } else if env.is_testing() {
        "info".to_string()
    } else {
        "debug".to_string()
    }
}

fn open_log_file() -> crate::Result<Mutex<File>> {
    std::fs::create_dir_all(LOG_DIR).map_err(crate::Error::logging)?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(Path::new(LOG_DIR).join(LOG_FILE))
        .map_err(crate::Error::logging)?;
    Ok(Mutex::new(file))
}

/// Installs the global subscriber and returns a handle for level reloads.
///
/// # Errors
///
/// Returns an error if the level directive is invalid, the log file cannot
/// be opened, or a global subscriber is already installed.
pub fn init(config: &AppConfig, override_level: Option<&str>) -> crate::Result<LogHandle> {
    let level = resolve_level(config, override_level);
    let filter = EnvFilter::try_new(&level).map_err(crate::Error::logging)?;
    let (filter_layer, handle) = reload::Layer::new(filter);

    let file_writer = if config.server.log_output.file {
        Some(open_log_file()?)
    } else {
        None
    };
    let console = config.server.log_output.console;
    let json = config.server.env.is_production() || config.server.env.is_staging();

    let registry = tracing_subscriber::registry().with(filter_layer);
    let result = if json {
        let console_layer = console.then(|| fmt::layer().json().flatten_event(true));
        let file_layer =
            file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w));
        registry.with(console_layer).with(file_layer).try_init()
    } else {
        let console_layer = console.then(|| fmt::layer());
        let file_layer = file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));
        registry.with(console_layer).with(file_layer).try_init()
    };
    result.map_err(crate::Error::logging)?;

    tracing::debug!(%level, "logger initialized");
    Ok(LogHandle { reload: handle })
}
