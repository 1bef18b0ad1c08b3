//! HTTP server wiring.
//!
//! A thin axum surface: request-id, trace and security-header middleware,
//! a request timeout, and the two health endpoints. `/health` is the plain
//! liveness probe; `/health/storage` reports per-backend connectivity from
//! the storage manager's non-mutating probes.

use crate::config::{AppConfig, ServerConfig};
use crate::storage::StorageManager;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared state injected into every handler.
pub struct AppState {
    /// The configuration snapshot the process started with.
    pub config: Arc<AppConfig>,
    /// The storage connection manager.
    pub storage: Arc<StorageManager>,
}

/// The listen address for the given server configuration.
#[must_use]
pub fn address(server: &ServerConfig) -> String {
    format!("0.0.0.0:{}", server.port)
}

/// Builds the application router with its middleware stack.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let request_timeout = state.config.server.request_timeout();

    Router::new()
        .route("/health", get(health))
        .route("/health/storage", get(storage_health))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Binds the listener and serves until the shutdown future resolves.
///
/// Returns once in-flight connections have drained; bounding the drain is
/// the caller's job (it owns the shutdown deadline).
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails while
/// serving.
pub async fn serve(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::Result<()> {
    let addr = address(&state.config.server);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "http server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
    }))
}

/// Per-backend connectivity report.
async fn storage_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let backends = state.storage.health().await;
    Json(json!({ "backends": backends }))
}
