pub mod health;
pub mod lot;
pub mod occupancies;
pub mod spots;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (live spot and status events)
///
/// /spots                               list all spots
/// /spots/{number}                      get one spot
/// /spots/{number}/check-in             occupy (POST)
/// /spots/{number}/check-out            release (POST)
/// /spots/{number}/qrcode               check-in QR code (PNG)
///
/// /lot/status                          free / occupied counts
///
/// /occupancies/history                 latest occupancies
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/spots", spots::router())
        .nest("/lot", lot::router())
        .nest("/occupancies", occupancies::router())
}
