#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use parking_api::config::ServerConfig;
use parking_api::router::build_app_router;
use parking_api::state::AppState;
use parking_api::ws::WsManager;
use parking_core::lot::ParkingConfig;
use parking_core::memory::MemoryStore;
use parking_core::ParkingService;
use parking_events::EventBus;
use tower::ServiceExt;

/// Base URL the QR deep-links are built from in tests.
pub const TEST_BASE_URL: &str = "http://parking.test";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// no database (in-memory store) and the default 50-spot lot.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        public_base_url: TEST_BASE_URL.to_string(),
        sweep_interval_secs: 300,
        parking: ParkingConfig::default(),
    }
}

/// Build the full application router over a freshly seeded in-memory lot.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack. The returned state gives tests access to
/// the event bus and the parking service.
pub async fn build_test_app() -> (Router, AppState) {
    build_test_app_with(test_config()).await
}

/// [`build_test_app`] with a custom configuration.
pub async fn build_test_app_with(config: ServerConfig) -> (Router, AppState) {
    let event_bus = Arc::new(EventBus::default());
    let parking = Arc::new(ParkingService::new(
        Arc::new(MemoryStore::new()),
        event_bus.clone(),
        config.parking.clone(),
    ));
    parking.initialize().await.unwrap();

    let state = AppState {
        config: Arc::new(config.clone()),
        parking,
        ws_manager: Arc::new(WsManager::new()),
        event_bus,
    };

    (build_app_router(state.clone(), &config), state)
}

/// Send a GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
