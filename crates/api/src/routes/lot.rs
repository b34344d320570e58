use axum::routing::get;
use axum::Router;

use crate::handlers::lot;
use crate::state::AppState;

/// Routes mounted at `/lot`.
pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(lot::get_status))
}
