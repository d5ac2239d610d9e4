use std::sync::{Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::services::parking::ParkingService;

pub struct AppState {
    pub parking: Mutex<ParkingService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(parking: ParkingService, config: AppConfig) -> Self {
        Self {
            parking: Mutex::new(parking),
            config,
        }
    }

    /// Holds the lock for a whole operation so each one commits atomically.
    pub fn parking(&self) -> MutexGuard<'_, ParkingService> {
        self.parking.lock().unwrap_or_else(|e| e.into_inner())
    }
}
