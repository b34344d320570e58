use axum::routing::get;
use axum::Router;

use crate::handlers::occupancies;
use crate::state::AppState;

/// Routes mounted at `/occupancies`.
pub fn router() -> Router<AppState> {
    Router::new().route("/history", get(occupancies::history))
}
