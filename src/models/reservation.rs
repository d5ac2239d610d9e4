use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::gate::GatePayload;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Started,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Started => "started",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and started reservations count against the one-per-user limit.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Started)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub spot_id: String,
    pub spot_number: String,
    pub location: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: ReservationStatus,
    pub entry_qr_code: String,
    pub exit_qr_code: String,
    /// Snapshot of the owner's allowance when the reservation was made.
    pub free_hours_allowance: u32,
    pub actual_entry_time: Option<NaiveDateTime>,
    pub actual_exit_time: Option<NaiveDateTime>,
    /// Minutes parked, set when the exit is recorded.
    pub total_duration: Option<i64>,
    pub free_hours_used: Option<u32>,
    pub extra_hours: Option<u32>,
    pub extra_fee: Option<u32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Reservation {
    /// A started reservation whose exit has been scanned but not yet paid for.
    pub fn awaiting_payment(&self) -> bool {
        self.status == ReservationStatus::Started && self.actual_exit_time.is_some()
    }

    pub fn gate_payload(&self) -> GatePayload {
        GatePayload {
            reservation_id: self.id.clone(),
            spot_number: self.spot_number.clone(),
            user_id: self.user_id.clone(),
        }
    }
}
