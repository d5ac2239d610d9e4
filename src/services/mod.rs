pub mod clock;
pub mod fees;
pub mod holds;
pub mod lifecycle;
pub mod parking;
