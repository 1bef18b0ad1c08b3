//! Binary entry point for chassis.
//!
//! Bootstrap order: environment files, CLI arguments, configuration
//! snapshot, logger, storage manager (fatal on init failure), HTTP server.
//! Shutdown order: drain the server within its deadline, then close
//! storage best-effort, logging but never escalating close failures.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for pre-logger fatal errors
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use chassis::config::{self, AppConfig, DEFAULT_CONFIG_PATH};
use chassis::observability::{self, LogHandle};
use chassis::server::{self, AppState};
use chassis::storage::StorageManager;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Chassis - async service bootstrap with managed storage connections.
#[derive(Parser)]
#[command(name = "chassis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, env = "CHASSIS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn).
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("chassis: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> chassis::Result<()> {
    let config_path = cli.config.clone();
    let config = Arc::new(match &config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_default()?,
    });

    let log_handle = observability::init(&config, cli.log_level.as_deref())?;
    info!(
        environment = %config.server.env,
        port = config.server.port,
        "starting application"
    );

    spawn_config_reload(&config, config_path, log_handle);

    let storage = Arc::new(StorageManager::new(config.clone()));
    // Startup policy: any enabled backend failing to connect is fatal.
    // The manager only classifies; the decision is made here.
    if let Err(err) = storage.init().await {
        if err.any_timeout() {
            error!(
                timeout = ?config.storage.connect_timeout(),
                "storage initialization timed out"
            );
        } else {
            error!(error = %err, "failed to initialize storage");
        }
        return Err(err.into());
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        storage: storage.clone(),
    });
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server_task = tokio::spawn(server::serve(state, async move {
        let _ = shutdown_rx.await;
    }));

    let exit = tokio::select! {
        () = shutdown_signal() => {
            info!("shutdown signal received, stopping server");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(config.server.shutdown_timeout(), &mut server_task).await {
                Ok(Ok(Ok(()))) => {
                    info!("server gracefully stopped");
                    Ok(())
                }
                Ok(Ok(Err(err))) => {
                    error!(error = %err, "server failed during shutdown");
                    Err(err)
                }
                Ok(Err(join_err)) => {
                    error!(error = %join_err, "server task panicked");
                    Err(std::io::Error::other(join_err).into())
                }
                Err(_) => {
                    error!(
                        timeout = ?config.server.shutdown_timeout(),
                        "server shutdown timed out"
                    );
                    Ok(())
                }
            }
        }
        result = &mut server_task => {
            // The server ended on its own: bind failure or fatal serve error.
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => {
                    error!(error = %err, "server failed unexpectedly");
                    Err(err)
                }
                Err(join_err) => {
                    error!(error = %join_err, "server task panicked");
                    Err(std::io::Error::other(join_err).into())
                }
            }
        }
    };

    // Storage close is best-effort: log and continue terminating.
    if let Err(err) = storage.close().await {
        if err.any_timeout() {
            error!(
                timeout = ?config.storage.shutdown_timeout(),
                "storage close timed out"
            );
        } else {
            error!(error = %err, "failed to close storage connections");
        }
    }

    exit
}

/// Wires SIGHUP-triggered configuration reloads.
///
/// A reload parses the file into a fresh immutable snapshot and publishes
/// it on the snapshot channel; the only subscriber today adjusts the log
/// level. The storage manager stays bound to its construction snapshot.
fn spawn_config_reload(
    initial: &Arc<AppConfig>,
    config_path: Option<PathBuf>,
    log_handle: LogHandle,
) {
    let (publisher, mut updates) = config::watch::channel(initial.clone());

    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            info!("configuration reloaded");
            if let Err(err) = log_handle.update_from(&snapshot) {
                warn!(error = %err, "could not apply reloaded log level");
            }
        }
    });

    #[cfg(unix)]
    {
        let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            let Ok(mut hangup) = signal(SignalKind::hangup()) else {
                return;
            };
            while hangup.recv().await.is_some() {
                match AppConfig::load(&path) {
                    Ok(next) => publisher.publish(Arc::new(next)),
                    Err(err) => {
                        warn!(error = %err, "configuration reload failed, keeping previous snapshot");
                    }
                }
            }
        });
    }
    #[cfg(not(unix))]
    drop((config_path, publisher));
}

/// Resolves when SIGINT or SIGTERM is delivered.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
