//! Exponential backoff schedule shared by the fetcher and the offline retry loop.

use std::time::Duration;

/// Delay schedule: `initial × multiplier^(attempt - 1)` after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
  /// Delay after the first failure, in milliseconds
  pub initial_ms: u64,
  pub multiplier: f64,
}

impl Backoff {
  pub const fn new(initial_ms: u64, multiplier: f64) -> Self {
    Self {
      initial_ms,
      multiplier,
    }
  }

  /// Delay to wait after failed attempt number `attempt` (1-based).
  pub fn delay_after(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let millis = self.initial_ms as f64 * self.multiplier.powi(exponent);
    if millis.is_finite() && millis > 0.0 {
      Duration::from_micros((millis * 1000.0).round() as u64)
    } else {
      Duration::ZERO
    }
  }
}
