use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use crate::errors::ParkingError;
use crate::models::{ParkingSpot, SpotStatus};

/// Owns the spot catalog and every status change on it.
///
/// All methods take `now` explicitly; expiry is enforced lazily by each
/// operation and eagerly by [`SpotHoldManager::sweep_expired`].
pub struct SpotHoldManager {
    spots: Vec<ParkingSpot>,
    hold_duration: Duration,
    // spot id -> user whose hold on it lapsed, so a late confirm can say why
    lapsed: HashMap<String, String>,
}

impl SpotHoldManager {
    pub fn new(hold_duration: Duration) -> Self {
        Self {
            spots: Vec::new(),
            hold_duration,
            lapsed: HashMap::new(),
        }
    }

    pub fn add_spot(&mut self, spot: ParkingSpot) {
        self.spots.push(spot);
    }

    pub fn spots(&self) -> &[ParkingSpot] {
        &self.spots
    }

    pub fn get(&self, spot_id: &str) -> Option<&ParkingSpot> {
        self.spots.iter().find(|s| s.id == spot_id)
    }

    fn get_mut(&mut self, spot_id: &str) -> Result<&mut ParkingSpot, ParkingError> {
        self.spots
            .iter_mut()
            .find(|s| s.id == spot_id)
            .ok_or_else(|| ParkingError::NotFound(format!("spot {spot_id}")))
    }

    /// Puts an available spot on hold for `user_id`. Any other spot the user
    /// was holding is released first.
    pub fn select_spot(
        &mut self,
        spot_id: &str,
        user_id: &str,
        now: &NaiveDateTime,
    ) -> Result<ParkingSpot, ParkingError> {
        self.expire_hold(spot_id, now);

        let status = self
            .get(spot_id)
            .map(|s| s.status)
            .ok_or_else(|| ParkingError::NotFound(format!("spot {spot_id}")))?;
        if status != SpotStatus::Available {
            tracing::debug!(spot_id, user_id, status = status.as_str(), "spot not selectable");
            return Err(ParkingError::HoldConflict);
        }

        for other in self.spots.iter_mut() {
            if other.id != spot_id && other.is_held_by(user_id) {
                tracing::info!(spot = %other.spot_number, user_id, "releasing previous hold");
                other.clear_hold();
            }
        }

        let until = *now + self.hold_duration;
        let spot = self.get_mut(spot_id)?;
        spot.status = SpotStatus::OnHold;
        spot.hold_until = Some(until);
        spot.hold_by_user_id = Some(user_id.to_string());
        let held = spot.clone();

        self.lapsed.remove(spot_id);
        tracing::info!(spot = %held.spot_number, user_id, hold_until = %until, "spot on hold");
        Ok(held)
    }

    /// Reverts a lapsed hold to available. Returns true if it did.
    pub fn expire_hold(&mut self, spot_id: &str, now: &NaiveDateTime) -> bool {
        let Some(spot) = self.spots.iter_mut().find(|s| s.id == spot_id) else {
            return false;
        };
        if !spot.hold_expired(now) {
            return false;
        }

        let holder = spot.hold_by_user_id.clone();
        spot.clear_hold();
        tracing::info!(spot = %spot.spot_number, "hold expired");
        if let Some(holder) = holder {
            self.lapsed.insert(spot_id.to_string(), holder);
        }
        true
    }

    /// Expires every lapsed hold, returning the ids of the spots freed.
    pub fn sweep_expired(&mut self, now: &NaiveDateTime) -> Vec<String> {
        let expired: Vec<String> = self
            .spots
            .iter()
            .filter(|s| s.hold_expired(now))
            .map(|s| s.id.clone())
            .collect();
        for id in &expired {
            self.expire_hold(id, now);
        }
        expired
    }

    pub fn release_hold(&mut self, spot_id: &str, user_id: &str) -> Result<(), ParkingError> {
        let spot = self.get_mut(spot_id)?;
        if !spot.is_held_by(user_id) {
            return Err(ParkingError::HoldConflict);
        }
        spot.clear_hold();
        tracing::info!(spot = %spot.spot_number, user_id, "hold released");
        Ok(())
    }

    /// Turns the caller's live hold into a reservation of the spot.
    ///
    /// Status, holder and expiry are all re-checked here; a countdown on the
    /// client side is never trusted.
    pub fn confirm(
        &mut self,
        spot_id: &str,
        user_id: &str,
        now: &NaiveDateTime,
    ) -> Result<ParkingSpot, ParkingError> {
        self.expire_hold(spot_id, now);
        let lapsed_for_user = self.lapsed.get(spot_id).map(String::as_str) == Some(user_id);

        let spot = self.get_mut(spot_id)?;
        if !spot.is_held_by(user_id) {
            if spot.status == SpotStatus::Available && lapsed_for_user {
                tracing::debug!(spot_id, user_id, "confirm after hold expiry");
                return Err(ParkingError::HoldExpired);
            }
            tracing::debug!(spot_id, user_id, status = spot.status.as_str(), "confirm on unheld spot");
            return Err(ParkingError::HoldConflict);
        }

        spot.status = SpotStatus::Reserved;
        spot.hold_until = None;
        spot.hold_by_user_id = None;
        let reserved = spot.clone();

        self.lapsed.remove(spot_id);
        tracing::info!(spot = %reserved.spot_number, user_id, "spot reserved");
        Ok(reserved)
    }

    /// Frees a reserved spot once its reservation is finished.
    pub fn release_reserved(&mut self, spot_id: &str) {
        if let Some(spot) = self.spots.iter_mut().find(|s| s.id == spot_id) {
            if spot.status == SpotStatus::Reserved {
                spot.clear_hold();
                tracing::info!(spot = %spot.spot_number, "spot released");
            }
        }
    }
}
