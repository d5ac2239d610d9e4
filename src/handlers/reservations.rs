use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Reservation;
use crate::services::parking::{BookingConfirmation, BookingPreview, ExitOutcome};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookingRequest {
    pub user_id: String,
    pub spot_id: String,
    /// `HH:MM`, 24-hour
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub user_id: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize)]
pub struct UserAction {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct TimesRequest {
    pub user_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

// POST /api/bookings/preview
pub async fn preview_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<BookingPreview>, AppError> {
    let preview =
        state
            .parking()
            .preview_booking(&payload.user_id, &payload.start_time, &payload.end_time)?;
    Ok(Json(preview))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingConfirmation>), AppError> {
    let confirmation = state.parking().book(
        &payload.user_id,
        &payload.spot_id,
        &payload.start_time,
        &payload.end_time,
    )?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

// GET /api/users/:user_id/reservations
pub async fn list_reservations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let parking = state.parking();
    parking.user(&user_id)?;
    Ok(Json(parking.reservations(&user_id)))
}

// GET /api/users/:user_id/reservations/active
pub async fn active_reservation(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Option<Reservation>>, AppError> {
    let parking = state.parking();
    parking.user(&user_id)?;
    Ok(Json(parking.active_reservation(&user_id)))
}

// POST /api/reservations/:id/entry
pub async fn record_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.parking().record_entry(&id)?;
    Ok(Json(reservation))
}

// POST /api/reservations/:id/exit
pub async fn record_exit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExitOutcome>, AppError> {
    let outcome = state.parking().record_exit(&id)?;
    Ok(Json(outcome))
}

// POST /api/reservations/:id/pay
pub async fn complete_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UserAction>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.parking().complete_payment(&payload.user_id, &id)?;
    Ok(Json(reservation))
}

// POST /api/reservations/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UserAction>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.parking().cancel(&payload.user_id, &id)?;
    Ok(Json(reservation))
}

// POST /api/reservations/:id/times
pub async fn update_times(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<TimesRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.parking().update_times(
        &payload.user_id,
        &id,
        payload.start_time,
        payload.end_time,
    )?;
    Ok(Json(reservation))
}
