use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::{AppError, ParkingError};
use crate::models::{MonthlyPlan, MonthlySubscription, PlanOffer};
use crate::state::AppState;

// GET /api/plans
pub async fn list_plans() -> Json<Vec<PlanOffer>> {
    Json(MonthlyPlan::ALL.iter().map(|p| p.offer()).collect())
}

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub plan: MonthlyPlan,
    pub license_plate: String,
    pub start_date: NaiveDate,
}

// POST /api/users/:user_id/plan
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<MonthlySubscription>), AppError> {
    let subscription = state.parking().subscribe(
        &user_id,
        payload.plan,
        &payload.license_plate,
        payload.start_date,
    )?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

// GET /api/users/:user_id/plan
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<MonthlySubscription>, AppError> {
    let subscription = state.parking().subscription(&user_id).cloned();
    subscription
        .map(Json)
        .ok_or_else(|| ParkingError::NotFound(format!("monthly plan for user {user_id}")).into())
}
