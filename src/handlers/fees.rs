use axum::extract::Query;
use axum::Json;
use serde::Deserialize;

use crate::services::fees::{compute_fee, FeeBreakdown};

#[derive(Deserialize)]
pub struct FeeQuery {
    pub minutes: i64,
    pub free_hours: u32,
}

// GET /api/fees?minutes=150&free_hours=2
pub async fn fee_quote(Query(query): Query<FeeQuery>) -> Json<FeeBreakdown> {
    Json(compute_fee(query.minutes, query.free_hours))
}
