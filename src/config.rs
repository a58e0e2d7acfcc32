use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::csv::DEFAULT_DELIMITER;
use crate::fetch::FetchConfig;
use crate::filter::DEFAULT_PAGE_SIZE;
use crate::offline::RetryPolicy;
use crate::retry::Backoff;

/// Environment variable consulted when no source URL is configured
pub const SOURCE_URL_ENV: &str = "QAMUS_SOURCE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub source: SourceConfig,
  pub fetch: FetchSection,
  pub retry: RetrySection,
  pub cache: CacheSection,
  pub browse: BrowseSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
  /// Published CSV export of the dictionary spreadsheet
  pub url: Option<String>,
  pub delimiter: char,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      url: None,
      delimiter: DEFAULT_DELIMITER,
    }
  }
}

/// Per-request retry settings of the fetcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
  pub attempts: u32,
  pub backoff_ms: u64,
  pub multiplier: f64,
  pub timeout_ms: u64,
  pub accept: String,
}

impl Default for FetchSection {
  fn default() -> Self {
    let defaults = FetchConfig::default();
    Self {
      attempts: defaults.attempts,
      backoff_ms: defaults.backoff.initial_ms,
      multiplier: defaults.backoff.multiplier,
      timeout_ms: defaults.timeout.as_millis() as u64,
      accept: defaults.accept,
    }
  }
}

/// Outer, connectivity-aware retry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
  pub attempts: u32,
  pub backoff_ms: u64,
  pub multiplier: f64,
}

impl Default for RetrySection {
  fn default() -> Self {
    let defaults = RetryPolicy::default();
    Self {
      attempts: defaults.attempts,
      backoff_ms: defaults.backoff.initial_ms,
      multiplier: defaults.backoff.multiplier,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSection {
  pub enabled: bool,
  pub namespace: String,
  /// How long a fetched dataset is reused
  pub ttl_hours: u64,
}

impl Default for CacheSection {
  fn default() -> Self {
    Self {
      enabled: true,
      namespace: "qamus".to_string(),
      ttl_hours: 24,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowseSection {
  pub page_size: usize,
}

impl Default for BrowseSection {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl Config {
  /// Load configuration from file, or defaults when there is none.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./qamus.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/qamus/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("qamus.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("qamus").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-default config
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn validate(&self) -> Result<()> {
    let delimiter = self.source.delimiter;
    if delimiter == '"' || delimiter == '\r' || delimiter == '\n' {
      return Err(eyre!("Invalid source delimiter {:?}", delimiter));
    }
    if self.browse.page_size == 0 {
      return Err(eyre!("browse.page_size must be at least 1"));
    }
    if self.cache.namespace.trim().is_empty() {
      return Err(eyre!("cache.namespace must not be empty"));
    }
    Ok(())
  }

  /// Resolve the data source URL.
  ///
  /// A command-line URL wins over the config file, which wins over
  /// `QAMUS_SOURCE_URL`.
  pub fn source_url(&self, cli_url: Option<&str>) -> Result<String> {
    resolve_source_url(
      cli_url,
      self.source.url.as_deref(),
      std::env::var(SOURCE_URL_ENV).ok().as_deref(),
    )
  }

  pub fn fetch_config(&self) -> FetchConfig {
    FetchConfig {
      attempts: self.fetch.attempts.max(1),
      backoff: Backoff::new(self.fetch.backoff_ms, self.fetch.multiplier),
      timeout: Duration::from_millis(self.fetch.timeout_ms),
      accept: self.fetch.accept.clone(),
      ..FetchConfig::default()
    }
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      attempts: self.retry.attempts.max(1),
      backoff: Backoff::new(self.retry.backoff_ms, self.retry.multiplier),
    }
  }

  pub fn entries_ttl(&self) -> Duration {
    Duration::from_secs(self.cache.ttl_hours.saturating_mul(60 * 60))
  }
}

fn resolve_source_url(
  cli_url: Option<&str>,
  config_url: Option<&str>,
  env_url: Option<&str>,
) -> Result<String> {
  let url = [cli_url, config_url, env_url]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|url| !url.is_empty())
    .ok_or_else(|| {
      eyre!(
        "No data source configured. Pass --url, set source.url in qamus.yaml, \
         or set the {} environment variable.",
        SOURCE_URL_ENV
      )
    })?;

  url::Url::parse(url).map_err(|e| eyre!("Invalid data source URL {}: {}", url, e))?;
  Ok(url.to_string())
}
