use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::ParkingError;
use crate::models::spot::demo_spots;
use crate::models::{
    BookingWindow, GateDirection, GatePayload, MonthlyPlan, MonthlySubscription,
    OvertimeAdvisory, ParkingSpot, Reservation, ReservationStatus, SpotStatus, User, UserType,
};
use crate::services::clock::{Clock, IdGenerator};
use crate::services::fees::{compute_fee, FeeBreakdown};
use crate::services::holds::SpotHoldManager;
use crate::services::lifecycle::ReservationBook;

#[derive(Debug, Clone, Serialize)]
pub struct SpotView {
    #[serde(flatten)]
    pub spot: ParkingSpot,
    pub remaining_hold_secs: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub full_name: String,
    pub university_id: String,
    pub phone_number: String,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingPreview {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_minutes: i64,
    pub advisory: Option<OvertimeAdvisory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub reservation: Reservation,
    pub advisory: Option<OvertimeAdvisory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExitOutcome {
    pub reservation: Reservation,
    pub fee: FeeBreakdown,
    pub payment_required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationQr {
    pub gate_code: String,
    pub payload: GatePayload,
    pub entry_qr_code: String,
    pub exit_qr_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GateScan {
    pub direction: GateDirection,
    pub reservation: Reservation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<FeeBreakdown>,
}

/// Application state for the parking core. Handlers reach users, spots and
/// reservations only through these methods.
pub struct ParkingService {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    users: HashMap<String, User>,
    holds: SpotHoldManager,
    ledger: ReservationBook,
    subscriptions: HashMap<String, MonthlySubscription>,
}

impl ParkingService {
    pub fn new(hold_minutes: i64, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            clock,
            ids,
            users: HashMap::new(),
            holds: SpotHoldManager::new(Duration::minutes(hold_minutes)),
            ledger: ReservationBook::new(),
            subscriptions: HashMap::new(),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn seed_demo_spots(&mut self) {
        let now = self.now();
        for spot in demo_spots(&now) {
            self.holds.add_spot(spot);
        }
    }

    pub fn add_spot(&mut self, spot: ParkingSpot) {
        self.holds.add_spot(spot);
    }

    // ── Accounts ──

    pub fn register(&mut self, account: NewAccount) -> Result<User, ParkingError> {
        let full_name = account.full_name.trim();
        let university_id = account.university_id.trim();
        if full_name.is_empty() || university_id.is_empty() {
            return Err(ParkingError::InvalidInput(
                "full name and university id are required".to_string(),
            ));
        }
        if self.users.values().any(|u| u.university_id == university_id) {
            return Err(ParkingError::InvalidInput(format!(
                "university id {university_id} is already registered"
            )));
        }

        let user = User::new(
            self.ids.next_id(),
            full_name.to_string(),
            university_id.to_string(),
            account.phone_number.trim().to_string(),
            account.user_type,
        );
        tracing::info!(user_id = %user.id, user_type = user.user_type.as_str(), "account created");
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    /// The password is accepted as-is; there is no credential store.
    pub fn login(&self, university_id: &str, _password: &str) -> Result<User, ParkingError> {
        self.users
            .values()
            .find(|u| u.university_id == university_id.trim())
            .cloned()
            .ok_or(ParkingError::Unauthorized)
    }

    pub fn user(&self, user_id: &str) -> Result<&User, ParkingError> {
        self.users
            .get(user_id)
            .ok_or_else(|| ParkingError::NotFound(format!("user {user_id}")))
    }

    // ── Spots ──

    pub fn list_spots(&mut self) -> Vec<SpotView> {
        let now = self.now();
        self.holds.sweep_expired(&now);
        self.holds
            .spots()
            .iter()
            .map(|spot| SpotView {
                spot: spot.clone(),
                remaining_hold_secs: spot.remaining_hold_secs(&now),
            })
            .collect()
    }

    pub fn select_spot(&mut self, user_id: &str, spot_id: &str) -> Result<SpotView, ParkingError> {
        self.user(user_id)?;
        let now = self.now();
        let spot = self.holds.select_spot(spot_id, user_id, &now)?;
        let remaining_hold_secs = spot.remaining_hold_secs(&now);
        Ok(SpotView {
            spot,
            remaining_hold_secs,
        })
    }

    pub fn release_spot(&mut self, user_id: &str, spot_id: &str) -> Result<(), ParkingError> {
        self.holds.release_hold(spot_id, user_id)
    }

    pub fn sweep_expired_holds(&mut self) -> usize {
        let now = self.now();
        self.holds.sweep_expired(&now).len()
    }

    // ── Booking ──

    fn window_for_today(&self, start: &str, end: &str) -> Result<BookingWindow, ParkingError> {
        let today: NaiveDate = self.now().date();
        BookingWindow::parse(today, start, end)
    }

    pub fn preview_booking(
        &self,
        user_id: &str,
        start: &str,
        end: &str,
    ) -> Result<BookingPreview, ParkingError> {
        let user_type = self.user(user_id)?.user_type;
        let window = self.window_for_today(start, end)?;
        let advisory = window.overtime_advisory(user_type);
        if advisory.is_some() {
            tracing::info!(user_id, minutes = window.duration_minutes(), "overtime advisory issued");
        }
        Ok(BookingPreview {
            start_time: window.start,
            end_time: window.end,
            duration_minutes: window.duration_minutes(),
            advisory,
        })
    }

    /// Confirms the caller's hold on `spot_id` and opens a pending
    /// reservation for today's `start`..`end`.
    pub fn book(
        &mut self,
        user_id: &str,
        spot_id: &str,
        start: &str,
        end: &str,
    ) -> Result<BookingConfirmation, ParkingError> {
        let user = self.user(user_id)?.clone();
        let window = self.window_for_today(start, end)?;
        self.ledger.ensure_no_active(&user.id)?;

        let now = self.now();
        let spot = self.holds.confirm(spot_id, &user.id, &now)?;
        let reservation = match self
            .ledger
            .create(&user, &spot, window, self.ids.as_ref(), &now)
        {
            Ok(r) => r,
            Err(e) => {
                self.holds.release_reserved(spot_id);
                return Err(e);
            }
        };

        Ok(BookingConfirmation {
            reservation,
            advisory: window.overtime_advisory(user.user_type),
        })
    }

    pub fn reservation(&self, reservation_id: &str) -> Result<&Reservation, ParkingError> {
        self.ledger
            .get(reservation_id)
            .ok_or_else(|| ParkingError::NotFound(format!("reservation {reservation_id}")))
    }

    fn owned_reservation(
        &self,
        user_id: &str,
        reservation_id: &str,
    ) -> Result<&Reservation, ParkingError> {
        let r = self.reservation(reservation_id)?;
        if r.user_id != user_id {
            return Err(ParkingError::Unauthorized);
        }
        Ok(r)
    }

    pub fn active_reservation(&self, user_id: &str) -> Option<Reservation> {
        self.ledger.active_for_user(user_id).cloned()
    }

    pub fn reservations(&self, user_id: &str) -> Vec<Reservation> {
        self.ledger.for_user(user_id)
    }

    // ── Lifecycle ──

    pub fn record_entry(&mut self, reservation_id: &str) -> Result<Reservation, ParkingError> {
        let now = self.now();
        self.ledger.record_entry(reservation_id, &now)
    }

    /// Stamps the exit and prices the stay. A stay inside the free hours
    /// finishes here; otherwise the reservation waits for payment.
    pub fn record_exit(&mut self, reservation_id: &str) -> Result<ExitOutcome, ParkingError> {
        let now = self.now();
        let exited = self.ledger.record_exit(reservation_id, &now)?;
        let fee = compute_fee(
            exited.total_duration.unwrap_or_default(),
            exited.free_hours_allowance,
        );

        let reservation = if fee.requires_payment() {
            exited
        } else {
            let done = self.ledger.complete_payment(reservation_id, &fee, &now)?;
            self.holds.release_reserved(&done.spot_id);
            done
        };

        Ok(ExitOutcome {
            reservation,
            fee,
            payment_required: fee.requires_payment(),
        })
    }

    pub fn complete_payment(
        &mut self,
        user_id: &str,
        reservation_id: &str,
    ) -> Result<Reservation, ParkingError> {
        let r = self.owned_reservation(user_id, reservation_id)?;
        let fee = compute_fee(r.total_duration.unwrap_or_default(), r.free_hours_allowance);

        let now = self.now();
        let done = self.ledger.complete_payment(reservation_id, &fee, &now)?;
        self.holds.release_reserved(&done.spot_id);
        Ok(done)
    }

    pub fn cancel(&mut self, user_id: &str, reservation_id: &str) -> Result<Reservation, ParkingError> {
        self.owned_reservation(user_id, reservation_id)?;
        let now = self.now();
        let cancelled = self.ledger.cancel(reservation_id, &now)?;
        self.holds.release_reserved(&cancelled.spot_id);
        Ok(cancelled)
    }

    pub fn update_times(
        &mut self,
        user_id: &str,
        reservation_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Reservation, ParkingError> {
        self.owned_reservation(user_id, reservation_id)?;
        let window = BookingWindow::new(start, end)?;
        let now = self.now();
        self.ledger.update_times(reservation_id, window, &now)
    }

    // ── Gate ──

    pub fn qr(&self, reservation_id: &str) -> Result<ReservationQr, ParkingError> {
        let r = self.reservation(reservation_id)?;
        let payload = r.gate_payload();
        Ok(ReservationQr {
            gate_code: payload.to_json(),
            payload,
            entry_qr_code: r.entry_qr_code.clone(),
            exit_qr_code: r.exit_qr_code.clone(),
        })
    }

    /// Accepts either an entry/exit token or the JSON gate payload. A payload
    /// opens the entry for a pending reservation and the exit for a started one.
    pub fn scan(&mut self, code: &str) -> Result<GateScan, ParkingError> {
        let code = code.trim();
        let (reservation_id, direction) = if let Ok(payload) = GatePayload::from_json(code) {
            let r = self.reservation(&payload.reservation_id)?;
            let direction = match r.status {
                ReservationStatus::Pending => GateDirection::Entry,
                ReservationStatus::Started => GateDirection::Exit,
                other => {
                    return Err(ParkingError::InvalidStateTransition {
                        from: other,
                        action: "scan",
                    })
                }
            };
            (r.id.clone(), direction)
        } else {
            let (r, direction) = self.ledger.find_by_token(code).ok_or_else(|| {
                tracing::warn!("unrecognised gate code");
                ParkingError::NotFound("gate code".to_string())
            })?;
            (r.id.clone(), direction)
        };

        match direction {
            GateDirection::Entry => Ok(GateScan {
                direction,
                reservation: self.record_entry(&reservation_id)?,
                fee: None,
            }),
            GateDirection::Exit => {
                let outcome = self.record_exit(&reservation_id)?;
                Ok(GateScan {
                    direction,
                    reservation: outcome.reservation,
                    fee: Some(outcome.fee),
                })
            }
        }
    }

    // ── Monthly plans ──

    pub fn subscribe(
        &mut self,
        user_id: &str,
        plan: MonthlyPlan,
        license_plate: &str,
        start_date: NaiveDate,
    ) -> Result<MonthlySubscription, ParkingError> {
        self.user(user_id)?;
        let license_plate = license_plate.trim();
        if license_plate.is_empty() {
            return Err(ParkingError::InvalidInput(
                "license plate is required".to_string(),
            ));
        }

        let subscription = MonthlySubscription {
            user_id: user_id.to_string(),
            plan,
            license_plate: license_plate.to_uppercase(),
            start_date,
            monthly_price: plan.offer().monthly_price,
        };
        if let Some(previous) = self
            .subscriptions
            .insert(user_id.to_string(), subscription.clone())
        {
            tracing::info!(user_id, previous = ?previous.plan, "monthly plan replaced");
        }
        tracing::info!(user_id, plan = ?plan, "monthly plan subscribed");
        Ok(subscription)
    }

    pub fn subscription(&self, user_id: &str) -> Option<&MonthlySubscription> {
        self.subscriptions.get(user_id)
    }

    pub fn spot_status(&self, spot_id: &str) -> Option<SpotStatus> {
        self.holds.get(spot_id).map(|s| s.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::{ManualClock, SequentialIds};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn setup() -> (ParkingService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(dt("2025-06-16 08:00")));
        let mut svc = ParkingService::new(5, clock.clone(), Arc::new(SequentialIds::new("id")));
        svc.add_spot(ParkingSpot::available("s1", "A-101", "Building A - Level 1"));
        svc.add_spot(ParkingSpot::available("s2", "A-102", "Building A - Level 1"));
        (svc, clock)
    }

    fn register(svc: &mut ParkingService, university_id: &str, user_type: UserType) -> User {
        svc.register(NewAccount {
            full_name: "Ghada Alajmi".to_string(),
            university_id: university_id.to_string(),
            phone_number: "+966501234567".to_string(),
            user_type,
        })
        .unwrap()
    }

    #[test]
    fn test_register_and_login() {
        let (mut svc, _) = setup();
        let user = register(&mut svc, "441100", UserType::GpStudent);
        assert_eq!(user.free_hours, 3);

        let logged_in = svc.login("441100", "anything").unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(svc.login("999", "x").unwrap_err(), ParkingError::Unauthorized);
    }

    #[test]
    fn test_register_duplicate_university_id() {
        let (mut svc, _) = setup();
        register(&mut svc, "441100", UserType::Student);
        let err = svc
            .register(NewAccount {
                full_name: "Someone Else".to_string(),
                university_id: "441100".to_string(),
                phone_number: String::new(),
                user_type: UserType::Staff,
            })
            .unwrap_err();
        assert!(matches!(err, ParkingError::InvalidInput(_)));
    }

    #[test]
    fn test_book_marks_spot_reserved() {
        let (mut svc, _) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();

        let confirmation = svc.book(&user.id, "s1", "09:00", "11:00").unwrap();
        assert_eq!(confirmation.reservation.status, ReservationStatus::Pending);
        assert_eq!(confirmation.reservation.start_time, dt("2025-06-16 09:00"));
        assert!(confirmation.advisory.is_none());
        assert_eq!(svc.spot_status("s1"), Some(SpotStatus::Reserved));
    }

    #[test]
    fn test_malformed_time_fails_before_confirming() {
        let (mut svc, _) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();

        let err = svc.book(&user.id, "s1", "9am", "11:00").unwrap_err();
        assert!(matches!(err, ParkingError::InvalidTime(_)));
        assert_eq!(svc.spot_status("s1"), Some(SpotStatus::OnHold));
    }

    #[test]
    fn test_active_conflict_leaves_hold_untouched() {
        let (mut svc, _) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();
        svc.book(&user.id, "s1", "09:00", "11:00").unwrap();

        svc.select_spot(&user.id, "s2").unwrap();
        let err = svc.book(&user.id, "s2", "12:00", "13:00").unwrap_err();
        assert_eq!(err, ParkingError::ActiveReservationConflict);
        assert_eq!(svc.spot_status("s2"), Some(SpotStatus::OnHold));
    }

    #[test]
    fn test_book_after_hold_expiry() {
        let (mut svc, clock) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();
        clock.advance(Duration::minutes(5));

        let err = svc.book(&user.id, "s1", "09:00", "11:00").unwrap_err();
        assert_eq!(err, ParkingError::HoldExpired);
        assert_eq!(svc.spot_status("s1"), Some(SpotStatus::Available));
        assert!(svc.active_reservation(&user.id).is_none());
    }

    #[test]
    fn test_list_spots_shows_countdown_and_expires_lazily() {
        let (mut svc, clock) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();

        clock.advance(Duration::seconds(61));
        let spots = svc.list_spots();
        assert_eq!(spots[0].remaining_hold_secs, Some(239));

        clock.advance(Duration::minutes(4));
        let spots = svc.list_spots();
        assert_eq!(spots[0].spot.status, SpotStatus::Available);
        assert_eq!(spots[0].remaining_hold_secs, None);
    }

    #[test]
    fn test_exit_within_free_hours_completes_without_payment() {
        let (mut svc, clock) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();
        let id = svc.book(&user.id, "s1", "09:00", "11:00").unwrap().reservation.id;

        svc.record_entry(&id).unwrap();
        clock.advance(Duration::minutes(90));
        let outcome = svc.record_exit(&id).unwrap();

        assert!(!outcome.payment_required);
        assert_eq!(outcome.reservation.status, ReservationStatus::Completed);
        assert_eq!(outcome.reservation.extra_fee, Some(0));
        assert_eq!(svc.spot_status("s1"), Some(SpotStatus::Available));
    }

    #[test]
    fn test_overtime_exit_requires_payment() {
        let (mut svc, clock) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();
        let id = svc.book(&user.id, "s1", "09:00", "11:00").unwrap().reservation.id;

        svc.record_entry(&id).unwrap();
        clock.advance(Duration::minutes(150));
        let outcome = svc.record_exit(&id).unwrap();
        assert!(outcome.payment_required);
        assert_eq!(outcome.fee.extra_fee, 10);
        assert_eq!(outcome.reservation.status, ReservationStatus::Started);

        let done = svc.complete_payment(&user.id, &id).unwrap();
        assert_eq!(done.status, ReservationStatus::Completed);
        assert_eq!(done.extra_hours, Some(1));
        assert_eq!(done.free_hours_used, Some(2));
    }

    #[test]
    fn test_cancel_frees_spot_and_allows_rebooking() {
        let (mut svc, _) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();
        let id = svc.book(&user.id, "s1", "09:00", "11:00").unwrap().reservation.id;

        svc.cancel(&user.id, &id).unwrap();
        assert_eq!(svc.spot_status("s1"), Some(SpotStatus::Available));

        svc.select_spot(&user.id, "s1").unwrap();
        assert!(svc.book(&user.id, "s1", "12:00", "13:00").is_ok());
    }

    #[test]
    fn test_cancel_by_other_user_rejected() {
        let (mut svc, _) = setup();
        let owner = register(&mut svc, "441100", UserType::Student);
        let other = register(&mut svc, "441101", UserType::Student);
        svc.select_spot(&owner.id, "s1").unwrap();
        let id = svc.book(&owner.id, "s1", "09:00", "11:00").unwrap().reservation.id;

        assert_eq!(svc.cancel(&other.id, &id).unwrap_err(), ParkingError::Unauthorized);
    }

    #[test]
    fn test_staff_preview_advisory() {
        let (mut svc, _) = setup();
        let staff = register(&mut svc, "9001", UserType::Staff);
        assert!(svc.preview_booking(&staff.id, "08:00", "17:00").unwrap().advisory.is_some());
        assert!(svc.preview_booking(&staff.id, "08:00", "14:00").unwrap().advisory.is_none());
    }

    #[test]
    fn test_scan_tokens_drive_lifecycle() {
        let (mut svc, clock) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();
        let r = svc.book(&user.id, "s1", "09:00", "11:00").unwrap().reservation;

        let scan = svc.scan(&r.entry_qr_code).unwrap();
        assert_eq!(scan.direction, GateDirection::Entry);
        assert_eq!(scan.reservation.status, ReservationStatus::Started);

        clock.advance(Duration::minutes(30));
        let scan = svc.scan(&r.exit_qr_code).unwrap();
        assert_eq!(scan.direction, GateDirection::Exit);
        assert_eq!(scan.fee.unwrap().total_hours, 1);

        assert!(svc.scan("EXIT-bogus").is_err());
    }

    #[test]
    fn test_scan_gate_payload() {
        let (mut svc, _) = setup();
        let user = register(&mut svc, "441100", UserType::Student);
        svc.select_spot(&user.id, "s1").unwrap();
        let r = svc.book(&user.id, "s1", "09:00", "11:00").unwrap().reservation;

        let qr = svc.qr(&r.id).unwrap();
        let scan = svc.scan(&qr.gate_code).unwrap();
        assert_eq!(scan.direction, GateDirection::Entry);
    }

    #[test]
    fn test_subscribe_uppercases_plate() {
        let (mut svc, _) = setup();
        let user = register(&mut svc, "441100", UserType::Staff);
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let sub = svc
            .subscribe(&user.id, MonthlyPlan::Premium, " abc 1234 ", start)
            .unwrap();
        assert_eq!(sub.license_plate, "ABC 1234");
        assert_eq!(sub.monthly_price, 200);

        assert!(svc.subscribe(&user.id, MonthlyPlan::Standard, "  ", start).is_err());
        assert_eq!(svc.subscription(&user.id).unwrap().plan, MonthlyPlan::Premium);
    }
}
