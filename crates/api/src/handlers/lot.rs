use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /lot/status -- total, free and occupied spot counts.
pub async fn get_status(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let status = state.parking.lot_status().await?;
    Ok(Json(DataResponse { data: status }))
}
