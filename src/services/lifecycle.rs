use chrono::NaiveDateTime;

use crate::errors::ParkingError;
use crate::models::gate::{entry_token, exit_token};
use crate::models::{
    BookingWindow, GateDirection, ParkingSpot, Reservation, ReservationStatus, User,
};
use crate::services::clock::IdGenerator;
use crate::services::fees::FeeBreakdown;

/// Every reservation made in this process, and the only code allowed to
/// change their status.
///
/// ```text
/// pending --entry--> started --exit--> [awaiting payment] --pay--> completed
/// pending --cancel--> cancelled
/// started --cancel--> cancelled   (only before the exit is recorded)
/// ```
#[derive(Default)]
pub struct ReservationBook {
    reservations: Vec<Reservation>,
}

impl ReservationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Reservation, ParkingError> {
        self.reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ParkingError::NotFound(format!("reservation {id}")))
    }

    pub fn active_for_user(&self, user_id: &str) -> Option<&Reservation> {
        self.reservations
            .iter()
            .find(|r| r.user_id == user_id && r.status.is_active())
    }

    pub fn for_user(&self, user_id: &str) -> Vec<Reservation> {
        self.reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn ensure_no_active(&self, user_id: &str) -> Result<(), ParkingError> {
        match self.active_for_user(user_id) {
            Some(active) => {
                tracing::debug!(user_id, active = %active.id, "user already has an active reservation");
                Err(ParkingError::ActiveReservationConflict)
            }
            None => Ok(()),
        }
    }

    pub fn create(
        &mut self,
        user: &User,
        spot: &ParkingSpot,
        window: BookingWindow,
        ids: &dyn IdGenerator,
        now: &NaiveDateTime,
    ) -> Result<Reservation, ParkingError> {
        self.ensure_no_active(&user.id)?;

        let reservation = Reservation {
            id: ids.next_id(),
            user_id: user.id.clone(),
            spot_id: spot.id.clone(),
            spot_number: spot.spot_number.clone(),
            location: spot.location.clone(),
            start_time: window.start,
            end_time: window.end,
            status: ReservationStatus::Pending,
            entry_qr_code: entry_token(&ids.next_id()),
            exit_qr_code: exit_token(&ids.next_id()),
            free_hours_allowance: user.free_hours,
            actual_entry_time: None,
            actual_exit_time: None,
            total_duration: None,
            free_hours_used: None,
            extra_hours: None,
            extra_fee: None,
            created_at: *now,
            updated_at: *now,
        };

        tracing::info!(
            reservation_id = %reservation.id,
            user_id = %user.id,
            spot = %spot.spot_number,
            "reservation created"
        );
        self.reservations.push(reservation.clone());
        Ok(reservation)
    }

    pub fn record_entry(
        &mut self,
        id: &str,
        now: &NaiveDateTime,
    ) -> Result<Reservation, ParkingError> {
        let r = self.get_mut(id)?;
        if r.status != ReservationStatus::Pending {
            return Err(ParkingError::InvalidStateTransition {
                from: r.status,
                action: "record entry for",
            });
        }

        r.status = ReservationStatus::Started;
        r.actual_entry_time = Some(*now);
        r.updated_at = *now;
        tracing::info!(reservation_id = %r.id, "entry recorded, session started");
        Ok(r.clone())
    }

    /// Stamps the exit and the minutes parked. The reservation stays
    /// `started` until payment; scanning out again re-stamps it.
    pub fn record_exit(
        &mut self,
        id: &str,
        now: &NaiveDateTime,
    ) -> Result<Reservation, ParkingError> {
        let r = self.get_mut(id)?;
        if r.status != ReservationStatus::Started {
            return Err(ParkingError::InvalidStateTransition {
                from: r.status,
                action: "record exit for",
            });
        }

        let entered = r.actual_entry_time.unwrap_or(r.start_time);
        let minutes = (*now - entered).num_minutes().max(0);

        r.actual_exit_time = Some(*now);
        r.total_duration = Some(minutes);
        r.updated_at = *now;
        tracing::info!(reservation_id = %r.id, minutes, "exit recorded");
        Ok(r.clone())
    }

    pub fn complete_payment(
        &mut self,
        id: &str,
        fee: &FeeBreakdown,
        now: &NaiveDateTime,
    ) -> Result<Reservation, ParkingError> {
        let r = self.get_mut(id)?;
        if !r.awaiting_payment() {
            return Err(ParkingError::InvalidStateTransition {
                from: r.status,
                action: "complete payment for",
            });
        }

        r.status = ReservationStatus::Completed;
        r.actual_exit_time = Some(*now);
        r.free_hours_used = Some(fee.free_hours_used);
        r.extra_hours = Some(fee.extra_hours);
        r.extra_fee = Some(fee.extra_fee);
        r.updated_at = *now;
        tracing::info!(
            reservation_id = %r.id,
            extra_hours = fee.extra_hours,
            extra_fee = fee.extra_fee,
            "reservation completed"
        );
        Ok(r.clone())
    }

    /// Once the exit is stamped the stay can only end through payment.
    pub fn cancel(&mut self, id: &str, now: &NaiveDateTime) -> Result<Reservation, ParkingError> {
        let r = self.get_mut(id)?;
        if r.status.is_terminal() || r.awaiting_payment() {
            return Err(ParkingError::InvalidStateTransition {
                from: r.status,
                action: "cancel",
            });
        }

        r.status = ReservationStatus::Cancelled;
        r.updated_at = *now;
        tracing::info!(reservation_id = %r.id, "reservation cancelled");
        Ok(r.clone())
    }

    pub fn update_times(
        &mut self,
        id: &str,
        window: BookingWindow,
        now: &NaiveDateTime,
    ) -> Result<Reservation, ParkingError> {
        let r = self.get_mut(id)?;
        if r.status != ReservationStatus::Pending {
            return Err(ParkingError::InvalidStateTransition {
                from: r.status,
                action: "edit",
            });
        }

        r.start_time = window.start;
        r.end_time = window.end;
        r.updated_at = *now;
        tracing::info!(reservation_id = %r.id, start = %window.start, end = %window.end, "reservation times updated");
        Ok(r.clone())
    }

    /// Matches a scanned code against the entry and exit tokens.
    pub fn find_by_token(&self, code: &str) -> Option<(&Reservation, GateDirection)> {
        self.reservations.iter().find_map(|r| {
            if r.entry_qr_code == code {
                Some((r, GateDirection::Entry))
            } else if r.exit_qr_code == code {
                Some((r, GateDirection::Exit))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use crate::services::clock::SequentialIds;
    use crate::services::fees::compute_fee;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn student() -> User {
        User::new(
            "u-1".to_string(),
            "Ghada Alajmi".to_string(),
            "441100".to_string(),
            "+966501234567".to_string(),
            UserType::Student,
        )
    }

    fn spot() -> ParkingSpot {
        ParkingSpot::available("1", "A-101", "Building A - Level 1")
    }

    fn window() -> BookingWindow {
        BookingWindow::new(dt("2025-06-16 09:00"), dt("2025-06-16 12:00")).unwrap()
    }

    fn booked() -> (ReservationBook, String) {
        let mut book = ReservationBook::new();
        let ids = SequentialIds::new("r");
        let r = book
            .create(&student(), &spot(), window(), &ids, &dt("2025-06-16 08:00"))
            .unwrap();
        (book, r.id)
    }

    #[test]
    fn test_create_is_pending_with_tokens() {
        let (book, id) = booked();
        let r = book.get(&id).unwrap();
        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.id, "r-1");
        assert_eq!(r.entry_qr_code, "ENTRY-r-2");
        assert_eq!(r.exit_qr_code, "EXIT-r-3");
        assert_eq!(r.free_hours_allowance, 2);
        assert!(r.actual_entry_time.is_none());
    }

    #[test]
    fn test_second_active_reservation_rejected() {
        let (mut book, _) = booked();
        let ids = SequentialIds::new("x");
        let err = book
            .create(&student(), &spot(), window(), &ids, &dt("2025-06-16 08:01"))
            .unwrap_err();
        assert_eq!(err, ParkingError::ActiveReservationConflict);
        assert_eq!(book.for_user("u-1").len(), 1);
    }

    #[test]
    fn test_create_after_cancel_succeeds() {
        let (mut book, id) = booked();
        book.cancel(&id, &dt("2025-06-16 08:10")).unwrap();
        let ids = SequentialIds::new("x");
        assert!(book
            .create(&student(), &spot(), window(), &ids, &dt("2025-06-16 08:11"))
            .is_ok());
        assert_eq!(book.for_user("u-1").len(), 2);
    }

    #[test]
    fn test_exit_on_pending_fails_without_mutation() {
        let (mut book, id) = booked();
        let before = book.get(&id).unwrap().clone();

        let err = book.record_exit(&id, &dt("2025-06-16 10:00")).unwrap_err();
        assert!(matches!(
            err,
            ParkingError::InvalidStateTransition {
                from: ReservationStatus::Pending,
                ..
            }
        ));

        let after = book.get(&id).unwrap();
        assert_eq!(after.status, before.status);
        assert_eq!(after.actual_exit_time, None);
        assert_eq!(after.total_duration, None);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn test_full_lifecycle() {
        let (mut book, id) = booked();

        let r = book.record_entry(&id, &dt("2025-06-16 09:05")).unwrap();
        assert_eq!(r.status, ReservationStatus::Started);
        assert_eq!(r.actual_entry_time, Some(dt("2025-06-16 09:05")));

        let r = book.record_exit(&id, &dt("2025-06-16 11:35")).unwrap();
        assert_eq!(r.status, ReservationStatus::Started);
        assert_eq!(r.total_duration, Some(150));
        assert!(r.awaiting_payment());

        let fee = compute_fee(150, r.free_hours_allowance);
        let r = book
            .complete_payment(&id, &fee, &dt("2025-06-16 11:36"))
            .unwrap();
        assert_eq!(r.status, ReservationStatus::Completed);
        assert_eq!(r.free_hours_used, Some(2));
        assert_eq!(r.extra_hours, Some(1));
        assert_eq!(r.extra_fee, Some(10));
        assert_eq!(r.actual_exit_time, Some(dt("2025-06-16 11:36")));
        assert!(book.active_for_user("u-1").is_none());
    }

    #[test]
    fn test_exit_duration_floors_partial_minutes() {
        let (mut book, id) = booked();
        let entry = dt("2025-06-16 09:00");
        book.record_entry(&id, &entry).unwrap();
        let exit = entry + chrono::Duration::seconds(119);
        let r = book.record_exit(&id, &exit).unwrap();
        assert_eq!(r.total_duration, Some(1));
    }

    #[test]
    fn test_payment_before_exit_rejected() {
        let (mut book, id) = booked();
        book.record_entry(&id, &dt("2025-06-16 09:00")).unwrap();
        let fee = compute_fee(60, 2);
        assert!(book
            .complete_payment(&id, &fee, &dt("2025-06-16 10:00"))
            .is_err());
        assert_eq!(book.get(&id).unwrap().status, ReservationStatus::Started);
    }

    #[test]
    fn test_entry_twice_rejected() {
        let (mut book, id) = booked();
        book.record_entry(&id, &dt("2025-06-16 09:00")).unwrap();
        assert!(book.record_entry(&id, &dt("2025-06-16 09:01")).is_err());
    }

    #[test]
    fn test_cancel_started_then_terminal() {
        let (mut book, id) = booked();
        book.record_entry(&id, &dt("2025-06-16 09:00")).unwrap();
        let r = book.cancel(&id, &dt("2025-06-16 09:30")).unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);

        assert!(book.cancel(&id, &dt("2025-06-16 09:31")).is_err());
        assert!(book.record_entry(&id, &dt("2025-06-16 09:31")).is_err());
        assert!(book.record_exit(&id, &dt("2025-06-16 09:31")).is_err());
    }

    #[test]
    fn test_cancel_after_exit_rejected() {
        let (mut book, id) = booked();
        book.record_entry(&id, &dt("2025-06-16 08:00")).unwrap();
        book.record_exit(&id, &dt("2025-06-16 13:00")).unwrap();

        let err = book.cancel(&id, &dt("2025-06-16 13:01")).unwrap_err();
        assert_eq!(
            err,
            ParkingError::InvalidStateTransition {
                from: ReservationStatus::Started,
                action: "cancel",
            }
        );

        let r = book.get(&id).unwrap();
        assert_eq!(r.status, ReservationStatus::Started);
        assert!(r.awaiting_payment());

        let fee = compute_fee(r.total_duration.unwrap(), r.free_hours_allowance);
        assert_eq!(fee.extra_fee, 30);
        let done = book.complete_payment(&id, &fee, &dt("2025-06-16 13:02")).unwrap();
        assert_eq!(done.status, ReservationStatus::Completed);
        assert_eq!(done.extra_fee, Some(30));
    }

    #[test]
    fn test_update_times_only_while_pending() {
        let (mut book, id) = booked();
        let later = BookingWindow::new(dt("2025-06-16 13:00"), dt("2025-06-16 15:00")).unwrap();
        let r = book.update_times(&id, later, &dt("2025-06-16 08:30")).unwrap();
        assert_eq!(r.start_time, dt("2025-06-16 13:00"));

        book.record_entry(&id, &dt("2025-06-16 13:00")).unwrap();
        assert!(book.update_times(&id, later, &dt("2025-06-16 13:01")).is_err());
    }

    #[test]
    fn test_allowance_snapshot_survives_profile_change() {
        let mut book = ReservationBook::new();
        let ids = SequentialIds::new("r");
        let mut user = student();
        let r = book
            .create(&user, &spot(), window(), &ids, &dt("2025-06-16 08:00"))
            .unwrap();

        user.user_type = UserType::Staff;
        user.free_hours = UserType::Staff.free_hours();

        assert_eq!(book.get(&r.id).unwrap().free_hours_allowance, 2);
    }

    #[test]
    fn test_find_by_token() {
        let (book, id) = booked();
        let r = book.get(&id).unwrap();
        let (found, dir) = book.find_by_token(&r.exit_qr_code).unwrap();
        assert_eq!(found.id, id);
        assert_eq!(dir, GateDirection::Exit);
        assert!(book.find_by_token("ENTRY-unknown").is_none());
    }

    #[test]
    fn test_unknown_reservation() {
        let mut book = ReservationBook::new();
        let err = book.record_entry("nope", &dt("2025-06-16 09:00")).unwrap_err();
        assert!(matches!(err, ParkingError::NotFound(_)));
    }
}
