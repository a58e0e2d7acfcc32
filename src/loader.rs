//! Cache-aside loading of the dictionary dataset.
//!
//! A cache hit returns immediately. On a miss the dataset is fetched, parsed
//! and cached under the outer offline retry loop, so each outer attempt may
//! itself make several HTTP attempts.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, KvBackend};
use crate::csv::parse_objects;
use crate::fetch::{FetchConfig, FetchError, Fetcher};
use crate::offline::{Connectivity, OfflineRetry, RetryExhausted};
use crate::record::{records_from_rows, Record};

/// Cache key of the parsed record sequence
pub const ENTRIES_KEY: &str = "entries";

/// How long a fetched dataset stays valid
pub const ENTRIES_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum LoadError {
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error("data source answered {0} with an empty body")]
  EmptyResponse(u16),
}

/// Where a loaded record set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
  Cache,
  Network,
}

#[derive(Debug, Clone)]
pub struct LoadResult {
  pub records: Vec<Record>,
  pub source: LoadSource,
  /// Outer attempts used; zero for a cache hit
  pub attempts: u32,
}

pub type LoadFailure = RetryExhausted<LoadError>;

/// Cached dataset, tagged with a digest of the URL it came from.
#[derive(Deserialize)]
struct CachedEntries {
  source: String,
  records: Vec<Record>,
}

#[derive(Serialize)]
struct CachedEntriesRef<'a> {
  source: &'a str,
  records: &'a [Record],
}

pub struct DataLoader<B: KvBackend, C: Connectivity> {
  source_url: String,
  source_digest: String,
  delimiter: char,
  fetcher: Fetcher,
  fetch_config: FetchConfig,
  cache: CacheStore<B>,
  retry: OfflineRetry<C>,
  ttl: Duration,
}

impl<B: KvBackend, C: Connectivity> DataLoader<B, C> {
  pub fn new(
    source_url: &str,
    delimiter: char,
    fetcher: Fetcher,
    fetch_config: FetchConfig,
    cache: CacheStore<B>,
    retry: OfflineRetry<C>,
  ) -> Self {
    Self {
      source_url: source_url.to_string(),
      source_digest: digest(source_url),
      delimiter,
      fetcher,
      fetch_config,
      cache,
      retry,
      ttl: ENTRIES_TTL,
    }
  }

  /// Override the dataset TTL.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn source_url(&self) -> &str {
    &self.source_url
  }

  /// Load records from cache, or from the network on a miss.
  pub async fn load(&self) -> Result<LoadResult, LoadFailure> {
    if let Some(records) = self.cached_records() {
      info!(records = records.len(), "loaded records from cache");
      return Ok(LoadResult {
        records,
        source: LoadSource::Cache,
        attempts: 0,
      });
    }

    let outcome = self.retry.run(|| self.fetch_records()).await?;
    info!(
      records = outcome.value.len(),
      attempts = outcome.attempts,
      "loaded records from network"
    );

    Ok(LoadResult {
      records: outcome.value,
      source: LoadSource::Network,
      attempts: outcome.attempts,
    })
  }

  /// Drop the cached dataset and load again.
  pub async fn reload(&self) -> Result<LoadResult, LoadFailure> {
    self.cache.remove(ENTRIES_KEY);
    self.load().await
  }

  fn cached_records(&self) -> Option<Vec<Record>> {
    let cached: CachedEntries = self.cache.get(ENTRIES_KEY)?;
    if cached.source != self.source_digest {
      debug!("cached records belong to another source");
      return None;
    }
    Some(cached.records)
  }

  async fn fetch_records(&self) -> Result<Vec<Record>, LoadError> {
    let response = self
      .fetcher
      .fetch(&self.source_url, &self.fetch_config)
      .await?;

    if !response.success || response.body.trim().is_empty() {
      return Err(LoadError::EmptyResponse(response.status));
    }

    let rows = parse_objects(&response.body, self.delimiter, true);
    let records = records_from_rows(&rows);
    debug!(rows = rows.len(), records = records.len(), "parsed data source");

    let entry = CachedEntriesRef {
      source: &self.source_digest,
      records: &records,
    };
    if !self.cache.set(ENTRIES_KEY, &entry, Some(self.ttl)) {
      warn!("could not cache loaded records");
    }

    Ok(records)
  }
}

fn digest(source_url: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(source_url.trim().as_bytes());
  hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{ManualClock, MemoryBackend};
  use crate::offline::{AlwaysOnline, RetryPolicy, StatusBanner};
  use crate::retry::Backoff;
  use crate::testutil::{StubResponse, StubServer};

  const CSV: &str = "\u{feff}Arabic,Transliteration,English,Category\r\n\
                     كتاب,kitāb,book,Objects\r\n\
                     ,,,Empty\r\n\
                     قلم,qalam,pen,Objects\r\n";

  fn fetch_config(attempts: u32) -> FetchConfig {
    FetchConfig {
      attempts,
      backoff: Backoff::new(1, 1.0),
      timeout: Duration::from_secs(5),
      ..FetchConfig::default()
    }
  }

  fn policy(attempts: u32) -> RetryPolicy {
    RetryPolicy {
      attempts,
      backoff: Backoff::new(1, 1.0),
    }
  }

  fn loader<C: Connectivity>(
    url: &str,
    cache: CacheStore<MemoryBackend>,
    connectivity: C,
    inner: u32,
    outer: u32,
  ) -> DataLoader<MemoryBackend, C> {
    DataLoader::new(
      url,
      ',',
      Fetcher::new().unwrap(),
      fetch_config(inner),
      cache,
      OfflineRetry::new(connectivity, policy(outer)),
    )
  }

  #[tokio::test]
  async fn test_miss_fetches_then_hit_skips_network() {
    let server = StubServer::start(vec![StubResponse::ok(CSV)]).await;
    let cache = CacheStore::new(MemoryBackend::new(), "qamus");
    let loader = loader(&server.url, cache, AlwaysOnline, 1, 1);

    let first = loader.load().await.unwrap();
    assert_eq!(first.source, LoadSource::Network);
    assert_eq!(first.attempts, 1);
    let terms: Vec<&str> = first.records.iter().map(|r| r.term.as_str()).collect();
    assert_eq!(terms, vec!["كتاب", "قلم"]);

    let second = loader.load().await.unwrap();
    assert_eq!(second.source, LoadSource::Cache);
    assert_eq!(second.records, first.records);
    assert_eq!(server.hits(), 1);
  }

  #[tokio::test]
  async fn test_retries_are_layered() {
    let server = StubServer::start(vec![StubResponse::ok("<!doctype html><p>moved</p>")]).await;
    let cache = CacheStore::new(MemoryBackend::new(), "qamus");
    let loader = loader(&server.url, cache, AlwaysOnline, 2, 3);

    let failure = loader.load().await.unwrap_err();

    assert_eq!(failure.attempts, 3);
    assert!(matches!(
      failure.last_error,
      LoadError::Fetch(FetchError::HtmlResponse)
    ));
    assert_eq!(server.hits(), 6);
  }

  #[tokio::test]
  async fn test_empty_body_is_retried() {
    let server = StubServer::start(vec![StubResponse::ok("  \n"), StubResponse::ok(CSV)]).await;
    let cache = CacheStore::new(MemoryBackend::new(), "qamus");
    let banner = StatusBanner::default();
    let loader = loader(&server.url, cache, banner.clone(), 1, 2);

    let result = loader.load().await.unwrap();

    assert_eq!(result.attempts, 2);
    assert_eq!(result.records.len(), 2);
    assert!(!banner.is_unavailable());
  }

  #[tokio::test]
  async fn test_exhaustion_leaves_indicator_shown() {
    let server = StubServer::start(vec![StubResponse::status(502, "bad gateway")]).await;
    let cache = CacheStore::new(MemoryBackend::new(), "qamus");
    let banner = StatusBanner::default();
    let loader = loader(&server.url, cache, banner.clone(), 1, 2);

    assert!(loader.load().await.is_err());
    assert!(banner.is_unavailable());
  }

  #[tokio::test]
  async fn test_expired_cache_is_not_used_as_fallback() {
    let server = StubServer::start(vec![
      StubResponse::ok(CSV),
      StubResponse::status(500, "down"),
    ])
    .await;
    let clock = ManualClock::at(0);
    let cache = CacheStore::new(MemoryBackend::new(), "qamus").with_clock(clock.clone());
    let loader = loader(&server.url, cache.clone(), AlwaysOnline, 1, 1);

    loader.load().await.unwrap();
    clock.advance(ENTRIES_TTL.as_millis() as i64 + 1);

    assert!(loader.load().await.is_err());
    assert_eq!(server.hits(), 2);
    assert!(cache.get::<serde_json::Value>(ENTRIES_KEY).is_none());
  }

  #[tokio::test]
  async fn test_cache_from_another_source_is_ignored() {
    let server = StubServer::start(vec![StubResponse::ok(CSV)]).await;
    let cache = CacheStore::new(MemoryBackend::new(), "qamus");
    cache.set(
      ENTRIES_KEY,
      &CachedEntriesRef {
        source: &digest("https://elsewhere.example/export.csv"),
        records: &[Record::default()],
      },
      None,
    );
    let loader = loader(&server.url, cache, AlwaysOnline, 1, 1);

    let result = loader.load().await.unwrap();

    assert_eq!(result.source, LoadSource::Network);
    assert_eq!(server.hits(), 1);
  }

  #[tokio::test]
  async fn test_reload_bypasses_cache() {
    let server = StubServer::start(vec![StubResponse::ok(CSV)]).await;
    let cache = CacheStore::new(MemoryBackend::new(), "qamus");
    let loader = loader(&server.url, cache, AlwaysOnline, 1, 1);

    loader.load().await.unwrap();
    let reloaded = loader.reload().await.unwrap();

    assert_eq!(reloaded.source, LoadSource::Network);
    assert_eq!(server.hits(), 2);
  }
}
