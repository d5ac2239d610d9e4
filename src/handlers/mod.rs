pub mod auth;
pub mod fees;
pub mod gate;
pub mod health;
pub mod plans;
pub mod reservations;
pub mod spots;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/spots", get(spots::list_spots))
        .route("/api/spots/:id/hold", post(spots::hold_spot))
        .route("/api/spots/:id/release", post(spots::release_spot))
        .route("/api/bookings/preview", post(reservations::preview_booking))
        .route("/api/bookings", post(reservations::create_booking))
        .route(
            "/api/users/:user_id/reservations",
            get(reservations::list_reservations),
        )
        .route(
            "/api/users/:user_id/reservations/active",
            get(reservations::active_reservation),
        )
        .route(
            "/api/reservations/:id/entry",
            post(reservations::record_entry),
        )
        .route("/api/reservations/:id/exit", post(reservations::record_exit))
        .route("/api/reservations/:id/pay", post(reservations::complete_payment))
        .route("/api/reservations/:id/cancel", post(reservations::cancel))
        .route("/api/reservations/:id/times", post(reservations::update_times))
        .route("/api/reservations/:id/qr", get(gate::reservation_qr))
        .route("/api/gate/scan", post(gate::scan))
        .route("/api/fees", get(fees::fee_quote))
        .route("/api/plans", get(plans::list_plans))
        .route(
            "/api/users/:user_id/plan",
            get(plans::get_subscription).post(plans::subscribe),
        )
        .with_state(state)
}
