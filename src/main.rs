use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use campus_parking::config::AppConfig;
use campus_parking::handlers;
use campus_parking::services::clock::{SystemClock, UuidGenerator};
use campus_parking::services::parking::ParkingService;
use campus_parking::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let mut parking = ParkingService::new(
        config.hold_minutes,
        Arc::new(SystemClock),
        Arc::new(UuidGenerator),
    );
    if config.seed_demo_spots {
        parking.seed_demo_spots();
        tracing::info!("seeded demo parking spots");
    }

    let state = Arc::new(AppState::new(parking, config.clone()));

    // Holds lapse on this tick even when nobody is looking at the spot list.
    let sweeper = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweeper.config.hold_sweep_secs));
        loop {
            interval.tick().await;
            let expired = sweeper.parking().sweep_expired_holds();
            if expired > 0 {
                tracing::debug!(expired, "hold sweep");
            }
        }
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr} (holds last {} min)", config.hold_minutes);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
