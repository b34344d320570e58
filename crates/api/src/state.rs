use std::sync::Arc;

use parking_core::ParkingService;
use parking_events::EventBus;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (base URL for QR links, timeouts).
    pub config: Arc<ServerConfig>,
    /// Check-in / check-out state machine over the configured store.
    pub parking: Arc<ParkingService>,
    /// WebSocket connection manager (viewers).
    pub ws_manager: Arc<WsManager>,
    /// Bus the parking service publishes state changes on.
    pub event_bus: Arc<EventBus>,
}
