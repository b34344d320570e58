//! Handlers for the `/spots` resource: listing, check-in, check-out and
//! the per-spot QR code.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use parking_core::error::CoreError;
use parking_core::types::SpotNumber;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /spots/{number}/check-in`.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub occupant_name: String,
}

/// Body of `POST /spots/{number}/check-out`.
#[derive(Debug, Deserialize)]
pub struct CheckOutRequest {
    #[serde(default)]
    pub occupant_name: String,
    #[serde(default)]
    pub pin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub success: bool,
    pub message: &'static str,
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct CheckOutResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Unwrap a JSON body, reporting malformed input in the standard error shape.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(input)| input)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// GET /spots
// ---------------------------------------------------------------------------

/// All spots ordered by number, with the active occupant when occupied.
pub async fn list_spots(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let spots = state.parking.list_spots().await?;
    Ok(Json(DataResponse { data: spots }))
}

// ---------------------------------------------------------------------------
// GET /spots/{number}
// ---------------------------------------------------------------------------

pub async fn get_spot(
    State(state): State<AppState>,
    Path(number): Path<SpotNumber>,
) -> AppResult<impl IntoResponse> {
    let spot = state
        .parking
        .get_spot(number)
        .await?
        .ok_or_else(|| CoreError::spot_not_found(number))?;
    Ok(Json(DataResponse { data: spot }))
}

// ---------------------------------------------------------------------------
// POST /spots/{number}/check-in
// ---------------------------------------------------------------------------

/// Occupy a free spot. The response carries the PIN needed to check out.
pub async fn check_in(
    State(state): State<AppState>,
    Path(number): Path<SpotNumber>,
    body: Result<Json<CheckInRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let input = json_body(body)?;
    let receipt = state.parking.check_in(number, &input.occupant_name).await?;

    Ok(Json(DataResponse {
        data: CheckInResponse {
            success: true,
            message: receipt.message,
            pin: receipt.pin,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /spots/{number}/check-out
// ---------------------------------------------------------------------------

pub async fn check_out(
    State(state): State<AppState>,
    Path(number): Path<SpotNumber>,
    body: Result<Json<CheckOutRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let input = json_body(body)?;
    let receipt = state
        .parking
        .check_out(number, &input.occupant_name, input.pin.as_deref())
        .await?;

    Ok(Json(DataResponse {
        data: CheckOutResponse {
            success: true,
            message: receipt.message,
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /spots/{number}/qrcode
// ---------------------------------------------------------------------------

/// PNG QR code encoding the spot's check-in deep-link.
pub async fn qr_code(
    State(state): State<AppState>,
    Path(number): Path<SpotNumber>,
) -> AppResult<impl IntoResponse> {
    let png = state
        .parking
        .qr_code_png(number, &state.config.public_base_url)
        .await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
