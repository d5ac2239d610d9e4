pub mod booking_window;
pub mod gate;
pub mod plan;
pub mod reservation;
pub mod spot;
pub mod user;

pub use booking_window::{BookingWindow, OvertimeAdvisory};
pub use gate::{GateDirection, GatePayload};
pub use plan::{MonthlyPlan, MonthlySubscription, PlanOffer};
pub use reservation::{Reservation, ReservationStatus};
pub use spot::{ParkingSpot, SpotStatus};
pub use user::{User, UserType};
