use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::parking::SpotView;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SpotAction {
    pub user_id: String,
}

// GET /api/spots
pub async fn list_spots(State(state): State<Arc<AppState>>) -> Json<Vec<SpotView>> {
    Json(state.parking().list_spots())
}

// POST /api/spots/:id/hold
pub async fn hold_spot(
    State(state): State<Arc<AppState>>,
    Path(spot_id): Path<String>,
    Json(payload): Json<SpotAction>,
) -> Result<Json<SpotView>, AppError> {
    let spot = state.parking().select_spot(&payload.user_id, &spot_id)?;
    Ok(Json(spot))
}

// POST /api/spots/:id/release
pub async fn release_spot(
    State(state): State<Arc<AppState>>,
    Path(spot_id): Path<String>,
    Json(payload): Json<SpotAction>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.parking().release_spot(&payload.user_id, &spot_id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
