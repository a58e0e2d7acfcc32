//! Core traits for the caching system.

use chrono::Utc;
use color_eyre::Result;

/// Trait for raw key-value persistence backends.
///
/// Keys arrive fully qualified (`namespace:key`); values are opaque strings.
pub trait KvBackend: Send + Sync {
  /// Read the value stored under `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Insert or replace the value stored under `key`.
  fn put(&self, key: &str, value: &str) -> Result<()>;

  /// Delete `key`. Deleting a missing key is not an error.
  fn delete(&self, key: &str) -> Result<()>;

  /// All stored keys starting with `prefix`.
  fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
  fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_millis(&self) -> i64 {
    Utc::now().timestamp_millis()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
  now: std::sync::Arc<std::sync::atomic::AtomicI64>,
}

#[cfg(test)]
impl ManualClock {
  pub fn at(millis: i64) -> Self {
    let clock = Self::default();
    clock.set(millis);
    clock
  }

  pub fn set(&self, millis: i64) {
    self.now.store(millis, std::sync::atomic::Ordering::SeqCst);
  }

  pub fn advance(&self, millis: i64) {
    self.now.fetch_add(millis, std::sync::atomic::Ordering::SeqCst);
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now_millis(&self) -> i64 {
    self.now.load(std::sync::atomic::Ordering::SeqCst)
  }
}
