use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub hold_minutes: i64,
    pub hold_sweep_secs: u64,
    pub seed_demo_spots: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            hold_minutes: 5,
            hold_sweep_secs: 1,
            seed_demo_spots: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            hold_minutes: env::var("HOLD_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(defaults.hold_minutes),
            hold_sweep_secs: env::var("HOLD_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(defaults.hold_sweep_secs),
            seed_demo_spots: env::var("SEED_DEMO_SPOTS")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(defaults.seed_demo_spots),
        }
    }
}
