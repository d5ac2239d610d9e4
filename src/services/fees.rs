use serde::{Deserialize, Serialize};

/// Charge per started hour beyond the free allowance.
pub const HOURLY_RATE: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub total_minutes: i64,
    pub total_hours: u32,
    pub free_hours_used: u32,
    pub extra_hours: u32,
    pub extra_fee: u32,
}

impl FeeBreakdown {
    pub fn requires_payment(&self) -> bool {
        self.extra_fee > 0
    }
}

/// Bills whole hours, always rounding up. Negative durations (clock skew
/// between entry and exit) bill as zero; hour counts beyond `u32` saturate.
pub fn compute_fee(total_duration_minutes: i64, free_hours_allowance: u32) -> FeeBreakdown {
    let minutes = total_duration_minutes.max(0);
    let hours = minutes / 60 + i64::from(minutes % 60 != 0);
    let total_hours = u32::try_from(hours).unwrap_or(u32::MAX);

    let free_hours_used = total_hours.min(free_hours_allowance);
    let extra_hours = total_hours.saturating_sub(free_hours_allowance);

    FeeBreakdown {
        total_minutes: minutes,
        total_hours,
        free_hours_used,
        extra_hours,
        extra_fee: extra_hours.saturating_mul(HOURLY_RATE),
    }
}
