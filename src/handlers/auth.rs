use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::User;
use crate::services::parking::NewAccount;
use crate::state::AppState;

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAccount>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.parking().register(payload)?;
    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub university_id: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user = state
        .parking()
        .login(&payload.university_id, &payload.password)?;
    tracing::info!(user_id = %user.id, "login");
    Ok(Json(user))
}
