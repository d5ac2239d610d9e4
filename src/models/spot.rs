use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    Available,
    OnHold,
    Reserved,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Available => "available",
            SpotStatus::OnHold => "on_hold",
            SpotStatus::Reserved => "reserved",
        }
    }
}

/// A parking spot. `hold_until` and `hold_by_user_id` are both set exactly
/// when the status is `OnHold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: String,
    pub spot_number: String,
    pub location: String,
    pub status: SpotStatus,
    pub hold_until: Option<NaiveDateTime>,
    pub hold_by_user_id: Option<String>,
}

impl ParkingSpot {
    pub fn available(id: &str, spot_number: &str, location: &str) -> Self {
        Self {
            id: id.to_string(),
            spot_number: spot_number.to_string(),
            location: location.to_string(),
            status: SpotStatus::Available,
            hold_until: None,
            hold_by_user_id: None,
        }
    }

    pub fn is_held_by(&self, user_id: &str) -> bool {
        self.status == SpotStatus::OnHold && self.hold_by_user_id.as_deref() == Some(user_id)
    }

    pub fn hold_expired(&self, now: &NaiveDateTime) -> bool {
        self.status == SpotStatus::OnHold
            && self.hold_until.map(|until| *now >= until).unwrap_or(true)
    }

    /// Whole seconds left on the hold, zero once it has lapsed.
    pub fn remaining_hold_secs(&self, now: &NaiveDateTime) -> Option<i64> {
        if self.status != SpotStatus::OnHold {
            return None;
        }
        self.hold_until
            .map(|until| (until - *now).num_seconds().max(0))
    }

    pub(crate) fn clear_hold(&mut self) {
        self.status = SpotStatus::Available;
        self.hold_until = None;
        self.hold_by_user_id = None;
    }
}

/// The demo catalog the mobile prototype ships with.
pub fn demo_spots(now: &NaiveDateTime) -> Vec<ParkingSpot> {
    let mut spots = vec![
        ParkingSpot::available("1", "A-101", "Building A - Level 1"),
        ParkingSpot::available("2", "A-102", "Building A - Level 1"),
        ParkingSpot::available("3", "A-103", "Building A - Level 1"),
        ParkingSpot::available("4", "B-201", "Building B - Level 2"),
        ParkingSpot::available("5", "B-202", "Building B - Level 2"),
        ParkingSpot::available("6", "C-301", "Building C - Level 3"),
        ParkingSpot::available("7", "C-302", "Building C - Level 3"),
        ParkingSpot::available("8", "D-101", "Building D - Level 1"),
    ];

    spots[2].status = SpotStatus::Reserved;

    // B-202 starts out held by someone outside this session.
    spots[4].status = SpotStatus::OnHold;
    spots[4].hold_until = Some(*now + chrono::Duration::minutes(5));
    spots[4].hold_by_user_id = Some("demo-holder".to_string());

    spots
}
