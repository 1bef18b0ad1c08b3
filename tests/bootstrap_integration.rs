//! End-to-end bootstrap tests: configuration file through storage manager
//! and HTTP surface, without touching any real backend.
#![allow(clippy::panic, clippy::uninlined_format_args)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chassis::config::AppConfig;
use chassis::server::{AppState, router};
use chassis::storage::{BackendKind, StorageError, StorageManager};
use std::io::Write;
use std::sync::Arc;
use tower::ServiceExt;

fn load_config(yaml: &str) -> AppConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    AppConfig::load(file.path()).unwrap()
}

#[tokio::test]
async fn test_bootstrap_with_all_backends_disabled() {
    let config = Arc::new(load_config(
        r"
server:
  port: 9911
  env: testing
storage:
  connect_timeout_secs: 2
",
    ));
    assert!(config.server.env.is_testing());

    let storage = Arc::new(StorageManager::new(config.clone()));

    // Init with nothing enabled is a no-op that succeeds.
    storage.init().await.unwrap();

    // Accessors report the normal negative result without connecting.
    let err = storage.postgres().await.unwrap_err();
    assert!(matches!(err, StorageError::NotConfigured { kind } if kind == BackendKind::Postgres));
    let err = storage.mongo().await.unwrap_err();
    assert!(matches!(err, StorageError::NotConfigured { kind } if kind == BackendKind::Mongo));
    let err = storage.redis().await.unwrap_err();
    assert!(matches!(err, StorageError::NotConfigured { kind } if kind == BackendKind::Redis));

    // Close is idempotent with nothing cached.
    storage.close().await.unwrap();
    storage.close().await.unwrap();
}

#[tokio::test]
async fn test_http_surface_over_disabled_storage() {
    let config = Arc::new(load_config("server:\n  env: testing\n"));
    let storage = Arc::new(StorageManager::new(config.clone()));
    let app = router(Arc::new(AppState { config, storage }));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/storage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let backends = json["backends"].as_array().unwrap();
    assert_eq!(backends.len(), 3);
    for backend in backends {
        assert_eq!(backend["enabled"], false);
        assert_eq!(backend["connected"], false);
    }
}

#[tokio::test]
async fn test_manager_is_bound_to_its_snapshot() {
    // Enabling a backend in a *new* snapshot must not affect an existing
    // manager: reconfiguration means constructing a new manager.
    let disabled = Arc::new(load_config("{}"));
    let storage = StorageManager::new(disabled);

    let mut reloaded = AppConfig::default();
    reloaded.storage.redis.enabled = true;
    drop(reloaded); // published elsewhere; the manager never sees it

    let err = storage.redis().await.unwrap_err();
    assert!(matches!(err, StorageError::NotConfigured { .. }));
}
