//! Namespaced key-value cache with absolute expiry.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{Clock, KvBackend, SystemClock};

/// A stored value and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  pub value: T,
  /// Milliseconds since the Unix epoch, `None` = never expires
  pub expiry: Option<i64>,
}

impl<T> CacheEntry<T> {
  pub fn is_expired(&self, now_millis: i64) -> bool {
    self.expiry.is_some_and(|expiry| now_millis > expiry)
  }
}

/// Cache store scoped to a namespace.
///
/// Failures never propagate: writes report `false`, reads report a miss.
/// Expired entries are evicted when read; there is no background sweep.
pub struct CacheStore<B: KvBackend> {
  backend: Arc<B>,
  namespace: String,
  clock: Arc<dyn Clock>,
}

impl<B: KvBackend> CacheStore<B> {
  pub fn new(backend: B, namespace: &str) -> Self {
    Self {
      backend: Arc::new(backend),
      namespace: namespace.to_string(),
      clock: Arc::new(SystemClock),
    }
  }

  /// Replace the time source.
  #[cfg(test)]
  pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  fn qualified(&self, key: &str) -> String {
    format!("{}:{}", self.namespace, key)
  }

  /// Store `value` under `key`, expiring `ttl` from now if given.
  pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
    let expiry = ttl.map(|ttl| {
      let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
      self.clock.now_millis().saturating_add(ttl_millis)
    });
    let entry = CacheEntry { value, expiry };

    let raw = match serde_json::to_string(&entry) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(key, error = %e, "failed to serialize cache entry");
        return false;
      }
    };

    match self.backend.put(&self.qualified(key), &raw) {
      Ok(()) => true,
      Err(e) => {
        warn!(key, error = %e, "failed to write cache entry");
        false
      }
    }
  }

  /// Read the value under `key`, or `None` if absent, expired or unreadable.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let qualified = self.qualified(key);
    let raw = match self.backend.get(&qualified) {
      Ok(raw) => raw?,
      Err(e) => {
        warn!(key, error = %e, "failed to read cache entry");
        return None;
      }
    };

    let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw) {
      Ok(entry) => entry,
      Err(e) => {
        debug!(key, error = %e, "discarding unreadable cache entry");
        return None;
      }
    };

    if entry.is_expired(self.clock.now_millis()) {
      debug!(key, "cache entry expired");
      self.remove(key);
      return None;
    }

    match serde_json::from_value(entry.value) {
      Ok(value) => Some(value),
      Err(e) => {
        debug!(key, error = %e, "cache entry has unexpected shape");
        None
      }
    }
  }

  pub fn remove(&self, key: &str) {
    if let Err(e) = self.backend.delete(&self.qualified(key)) {
      warn!(key, error = %e, "failed to remove cache entry");
    }
  }

  /// Remove every key in this namespace. Returns how many were removed.
  pub fn clear_all(&self) -> usize {
    let prefix = format!("{}:", self.namespace);
    let keys = match self.backend.keys_with_prefix(&prefix) {
      Ok(keys) => keys,
      Err(e) => {
        warn!(error = %e, "failed to list cache entries");
        return 0;
      }
    };

    keys
      .iter()
      .filter(|key| self.backend.delete(key).is_ok())
      .count()
  }
}

impl<B: KvBackend> Clone for CacheStore<B> {
  fn clone(&self) -> Self {
    Self {
      backend: Arc::clone(&self.backend),
      namespace: self.namespace.clone(),
      clock: Arc::clone(&self.clock),
    }
  }
}
