use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::ReservationStatus;

/// Failures of the reservation core. Every variant is recoverable and is
/// returned before any state has been touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParkingError {
    #[error("cannot {action} a {from} reservation")]
    InvalidStateTransition {
        from: ReservationStatus,
        action: &'static str,
    },

    #[error("you already have an active reservation")]
    ActiveReservationConflict,

    #[error("the hold on this spot has expired, please select it again")]
    HoldExpired,

    #[error("this spot is no longer available")]
    HoldConflict,

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Parking(#[from] ParkingError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Parking(e) => match e {
                ParkingError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
                ParkingError::ActiveReservationConflict => StatusCode::CONFLICT,
                ParkingError::HoldConflict => StatusCode::CONFLICT,
                ParkingError::HoldExpired => StatusCode::GONE,
                ParkingError::InvalidTime(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ParkingError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ParkingError::NotFound(_) => StatusCode::NOT_FOUND,
                ParkingError::Unauthorized => StatusCode::UNAUTHORIZED,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
