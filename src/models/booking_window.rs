use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::ParkingError;
use crate::models::UserType;

/// Longest span a staff member can book before the overtime warning shows.
pub const STAFF_ADVISORY_HOURS: i64 = 8;

/// The intended parking span, built from two `HH:MM` strings on one day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BookingWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OvertimeAdvisory {
    pub booked_minutes: i64,
    pub free_hours: u32,
    pub hourly_rate: u32,
    pub message: String,
}

impl BookingWindow {
    pub fn parse(date: NaiveDate, start: &str, end: &str) -> Result<Self, ParkingError> {
        let start = date.and_time(parse_time(start)?);
        let end = date.and_time(parse_time(end)?);
        Self::new(start, end)
    }

    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ParkingError> {
        if end <= start {
            return Err(ParkingError::InvalidTime(format!(
                "end time {} must be after start time {}",
                end.format("%H:%M"),
                start.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Non-blocking warning shown to staff booking past their free hours.
    /// Students are never warned at booking time.
    pub fn overtime_advisory(&self, user_type: UserType) -> Option<OvertimeAdvisory> {
        if user_type != UserType::Staff {
            return None;
        }
        let minutes = self.duration_minutes();
        if minutes <= STAFF_ADVISORY_HOURS * 60 {
            return None;
        }
        Some(OvertimeAdvisory {
            booked_minutes: minutes,
            free_hours: user_type.free_hours(),
            hourly_rate: crate::services::fees::HOURLY_RATE,
            message: format!(
                "You are booking more than {STAFF_ADVISORY_HOURS} hours. You will be charged {} per hour for extra time.",
                crate::services::fees::HOURLY_RATE
            ),
        })
    }
}

/// Strict 24-hour `HH:MM`.
pub fn parse_time(s: &str) -> Result<NaiveTime, ParkingError> {
    let invalid = || ParkingError::InvalidTime(format!("expected HH:MM, got {s:?}"));

    let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
    if hour.len() != 2 || minute.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}
