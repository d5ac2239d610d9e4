use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::parking::{GateScan, ReservationQr};
use crate::state::AppState;

// GET /api/reservations/:id/qr
pub async fn reservation_qr(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReservationQr>, AppError> {
    let qr = state.parking().qr(&id)?;
    Ok(Json(qr))
}

#[derive(Deserialize)]
pub struct ScanRequest {
    pub code: String,
}

// POST /api/gate/scan
pub async fn scan(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<GateScan>, AppError> {
    let scan = state.parking().scan(&payload.code)?;
    tracing::info!(
        reservation_id = %scan.reservation.id,
        direction = ?scan.direction,
        "gate scan accepted"
    );
    Ok(Json(scan))
}
