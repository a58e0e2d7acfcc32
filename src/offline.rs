//! Connectivity-aware retry around an arbitrary async operation.
//!
//! The orchestrator knows nothing about HTTP or caching. It probes
//! connectivity once, raises the "network unavailable" indicator whenever an
//! attempt fails, lowers it on success, and backs off between attempts.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::retry::Backoff;

/// Give up on the connectivity probe after this long and assume offline.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Connectivity signal and the unavailable indicator it drives.
///
/// `show_unavailable` and `hide_unavailable` must be idempotent.
pub trait Connectivity: Send + Sync {
  fn is_online(&self) -> impl Future<Output = bool> + Send;
  fn show_unavailable(&self);
  fn hide_unavailable(&self);
}

impl<C: Connectivity> Connectivity for Arc<C> {
  fn is_online(&self) -> impl Future<Output = bool> + Send {
    self.as_ref().is_online()
  }

  fn show_unavailable(&self) {
    self.as_ref().show_unavailable()
  }

  fn hide_unavailable(&self) {
    self.as_ref().hide_unavailable()
  }
}

/// Outer retry budget, distinct from the fetcher's own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
  pub attempts: u32,
  pub backoff: Backoff,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      attempts: 5,
      backoff: Backoff::new(2000, 1.8),
    }
  }
}

/// A successful result and how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
  pub value: T,
  pub attempts: u32,
}

/// Every attempt failed; carries the last error.
#[derive(Debug)]
pub struct RetryExhausted<E> {
  pub attempts: u32,
  pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "gave up after {} attempts: {}",
      self.attempts, self.last_error
    )
  }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    Some(&self.last_error)
  }
}

pub struct OfflineRetry<C> {
  connectivity: C,
  policy: RetryPolicy,
}

impl<C: Connectivity> OfflineRetry<C> {
  pub fn new(connectivity: C, policy: RetryPolicy) -> Self {
    Self {
      connectivity,
      policy,
    }
  }

  /// Run `operation` until it succeeds or the attempt budget is spent.
  pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<Retried<T>, RetryExhausted<E>>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
  {
    if !self.connectivity.is_online().await {
      debug!("offline before first attempt");
      self.connectivity.show_unavailable();
    }

    let attempts = self.policy.attempts.max(1);
    let mut attempt = 1;

    loop {
      match operation().await {
        Ok(value) => {
          self.connectivity.hide_unavailable();
          return Ok(Retried {
            value,
            attempts: attempt,
          });
        }
        Err(error) => {
          self.connectivity.show_unavailable();
          if attempt >= attempts {
            warn!(attempt, %error, "retries exhausted");
            return Err(RetryExhausted {
              attempts: attempt,
              last_error: error,
            });
          }
          let delay = self.policy.backoff.delay_after(attempt);
          warn!(attempt, ?delay, %error, "attempt failed, backing off");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
      }
    }
  }
}

/// Shared indicator state read by the terminal UI.
///
/// Connectivity is probed by resolving the data source host.
#[derive(Debug, Clone, Default)]
pub struct StatusBanner {
  inner: Arc<BannerState>,
}

#[derive(Debug, Default)]
struct BannerState {
  unavailable: AtomicBool,
  probe_addr: Option<String>,
}

impl StatusBanner {
  /// Banner whose probe resolves the host of `source_url`.
  pub fn for_source(source_url: &str) -> Self {
    let probe_addr = url::Url::parse(source_url).ok().and_then(|url| {
      let host = url.host_str()?.to_string();
      let port = url.port_or_known_default()?;
      Some(format!("{}:{}", host, port))
    });

    Self {
      inner: Arc::new(BannerState {
        unavailable: AtomicBool::new(false),
        probe_addr,
      }),
    }
  }

  pub fn is_unavailable(&self) -> bool {
    self.inner.unavailable.load(Ordering::Relaxed)
  }
}

impl Connectivity for StatusBanner {
  fn is_online(&self) -> impl Future<Output = bool> + Send {
    let probe_addr = self.inner.probe_addr.clone();
    async move {
      let Some(addr) = probe_addr else {
        return true;
      };
      match tokio::time::timeout(PROBE_TIMEOUT, tokio::net::lookup_host(addr)).await {
        Ok(Ok(mut addrs)) => addrs.next().is_some(),
        _ => false,
      }
    }
  }

  fn show_unavailable(&self) {
    if !self.inner.unavailable.swap(true, Ordering::Relaxed) {
      debug!("network unavailable indicator shown");
    }
  }

  fn hide_unavailable(&self) {
    if self.inner.unavailable.swap(false, Ordering::Relaxed) {
      debug!("network unavailable indicator hidden");
    }
  }
}

/// Connectivity that is never reported offline and has no indicator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
  async fn is_online(&self) -> bool {
    true
  }

  fn show_unavailable(&self) {}

  fn hide_unavailable(&self) {}
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicU32;
  use std::sync::Mutex;
  use tokio::time::Instant;

  #[derive(Default)]
  struct Recorder {
    offline: bool,
    shows: AtomicU32,
    hides: AtomicU32,
  }

  impl Connectivity for Recorder {
    async fn is_online(&self) -> bool {
      !self.offline
    }

    fn show_unavailable(&self) {
      self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn hide_unavailable(&self) {
      self.hides.fetch_add(1, Ordering::SeqCst);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_always_failing_uses_whole_budget_with_backoff() {
    let recorder = Arc::new(Recorder::default());
    let retry = OfflineRetry::new(recorder.clone(), RetryPolicy::default());
    let started = Arc::new(Mutex::new(Vec::new()));

    let calls = started.clone();
    let result: Result<Retried<()>, _> = retry
      .run(|| {
        calls.lock().unwrap().push(Instant::now());
        async { Err("unreachable") }
      })
      .await;

    let error = result.unwrap_err();
    assert_eq!(error.attempts, 5);
    assert_eq!(error.last_error, "unreachable");

    let started = started.lock().unwrap();
    assert_eq!(started.len(), 5);
    let backoff = RetryPolicy::default().backoff;
    for k in 1..started.len() {
      let waited = started[k] - started[k - 1];
      let expected = backoff.delay_after(k as u32);
      let skew = if waited > expected {
        waited - expected
      } else {
        expected - waited
      };
      assert!(skew <= Duration::from_millis(1), "attempt {}: {:?}", k + 1, waited);
    }
    assert_eq!(recorder.shows.load(Ordering::SeqCst), 5);
    assert_eq!(recorder.hides.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_success_stops_retrying() {
    let recorder = Arc::new(Recorder::default());
    let retry = OfflineRetry::new(recorder.clone(), RetryPolicy::default());
    let calls = AtomicU32::new(0);

    let result = retry
      .run(|| {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
          if call < 3 {
            Err(format!("failure {}", call))
          } else {
            Ok(call)
          }
        }
      })
      .await
      .unwrap();

    assert_eq!(result, Retried { value: 3, attempts: 3 });
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(recorder.shows.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.hides.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_offline_shows_indicator_before_first_attempt() {
    let recorder = Arc::new(Recorder {
      offline: true,
      ..Default::default()
    });
    let retry = OfflineRetry::new(recorder.clone(), RetryPolicy::default());

    let result = retry.run(|| async { Ok::<_, String>("data") }).await.unwrap();

    assert_eq!(result.attempts, 1);
    assert_eq!(recorder.shows.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.hides.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_banner_is_idempotent() {
    let banner = StatusBanner::default();
    assert!(!banner.is_unavailable());

    banner.show_unavailable();
    banner.show_unavailable();
    assert!(banner.is_unavailable());

    banner.hide_unavailable();
    banner.hide_unavailable();
    assert!(!banner.is_unavailable());
  }

  #[tokio::test]
  async fn test_banner_without_probe_is_online() {
    assert!(StatusBanner::default().is_online().await);
    assert!(StatusBanner::for_source("not a url").is_online().await);
  }

  #[test]
  fn test_exhausted_message() {
    let error = RetryExhausted {
      attempts: 5,
      last_error: "timeout",
    };
    assert_eq!(error.to_string(), "gave up after 5 attempts: timeout");
  }
}
