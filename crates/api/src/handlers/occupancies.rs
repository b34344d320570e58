use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /occupancies/history -- the most recent occupancies, newest first.
///
/// PINs are never part of the serialized rows.
pub async fn history(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = state.parking.history().await?;
    Ok(Json(DataResponse { data: rows }))
}
