//! Route definitions for the `/spots` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::spots;
use crate::state::AppState;

/// Routes mounted at `/spots`.
///
/// ```text
/// GET    /                     -> list_spots
/// GET    /{number}             -> get_spot
/// POST   /{number}/check-in    -> check_in
/// POST   /{number}/check-out   -> check_out
/// GET    /{number}/qrcode      -> qr_code
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(spots::list_spots))
        .route("/{number}", get(spots::get_spot))
        .route("/{number}/check-in", post(spots::check_in))
        .route("/{number}/check-out", post(spots::check_out))
        .route("/{number}/qrcode", get(spots::qr_code))
}
