// Jittered cycle delay
// Each cycle draws a fresh delay around the base interval

use crate::models::JitterConfig;
use rand::Rng;
use std::time::Duration;

/// Delay in whole seconds for one draw.
///
/// `unit` is uniform in [0, 1) and `positive` picks the sign. The offset
/// is `unit * percent / 100 * base`; the sum is floored.
pub fn jittered_delay_seconds(
    base_interval_seconds: u64,
    jitter_percent: u8,
    unit: f64,
    positive: bool,
) -> u64 {
    let base = base_interval_seconds as f64;
    let ratio = unit * f64::from(jitter_percent) / 100.0;
    let sign = if positive { 1.0 } else { -1.0 };

    let delay = base + sign * ratio * base;
    delay.max(0.0).floor() as u64
}

impl JitterConfig {
    /// Inclusive bounds for a jittered delay, in seconds
    pub fn bounds(&self) -> (f64, f64) {
        let base = self.base_interval_seconds as f64;
        let spread = base * f64::from(self.jitter_percent) / 100.0;
        (base - spread, base + spread)
    }

    /// Draw the next cycle delay
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.jitter_percent == 0 {
            return Duration::from_secs(self.base_interval_seconds);
        }

        let unit: f64 = rng.gen();
        let positive = rng.gen_bool(0.5);
        Duration::from_secs(jittered_delay_seconds(
            self.base_interval_seconds,
            self.jitter_percent,
            unit,
            positive,
        ))
    }
}
