use std::time::Duration;

use preflight_types::BASE_FEE;

/// Lifecycle tuning
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Inclusion fee in stroops; the simulated resource fee is added on top
    pub base_fee: u32,
    /// How long after building the envelope stays valid
    pub validity_window: Duration,
    /// Delay between status queries
    pub poll_interval: Duration,
    /// Re-queries allowed after the first status query before giving up
    /// with `TimedOut`
    pub max_poll_attempts: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            base_fee: BASE_FEE,
            validity_window: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 30,
        }
    }
}
