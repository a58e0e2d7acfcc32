//! HTTP retrieval with per-attempt timeouts, retries and backoff.

use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::csv::looks_like_html;
use crate::retry::Backoff;

/// Request and retry settings for a single fetch.
#[derive(Debug, Clone)]
pub struct FetchConfig {
  /// Total number of attempts, including the first
  pub attempts: u32,
  pub backoff: Backoff,
  /// Applies to each attempt separately
  pub timeout: Duration,
  pub accept: String,
  pub method: Method,
  pub headers: Vec<(String, String)>,
  pub body: Option<String>,
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self {
      attempts: 3,
      backoff: Backoff::new(1000, 2.0),
      timeout: Duration::from_millis(15_000),
      accept: "text/csv, text/plain, */*".to_string(),
      method: Method::GET,
      headers: Vec::new(),
      body: None,
    }
  }
}

/// A successfully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
  pub success: bool,
  pub status: u16,
  pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request timed out after {0:?}")]
  Timeout(Duration),
  #[error("server responded with {0}")]
  Status(StatusCode),
  #[error("server returned an HTML page instead of tabular data")]
  HtmlResponse,
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),
}

/// HTTP client that retries failed requests with exponential backoff.
#[derive(Clone)]
pub struct Fetcher {
  client: reqwest::Client,
}

impl Fetcher {
  pub fn new() -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("qamus/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self { client })
  }

  /// Fetch `url`, retrying failures up to `config.attempts` times in total.
  ///
  /// Non-success statuses and HTML pages count as failures. The error of the
  /// last attempt is returned once attempts run out.
  pub async fn fetch(&self, url: &str, config: &FetchConfig) -> Result<FetchResponse, FetchError> {
    let attempts = config.attempts.max(1);
    let mut attempt = 1;

    loop {
      debug!(url, attempt, "fetching");
      match self.fetch_once(url, config).await {
        Ok(response) => return Ok(response),
        Err(error) if attempt < attempts => {
          let delay = config.backoff.delay_after(attempt);
          warn!(url, attempt, ?delay, %error, "fetch failed, retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(error) => {
          warn!(url, attempt, %error, "fetch failed, giving up");
          return Err(error);
        }
      }
    }
  }

  async fn fetch_once(&self, url: &str, config: &FetchConfig) -> Result<FetchResponse, FetchError> {
    let mut request = self
      .client
      .request(config.method.clone(), url)
      .header(ACCEPT, config.accept.as_str());
    for (name, value) in &config.headers {
      request = request.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &config.body {
      request = request.body(body.clone());
    }
    let request = request.build()?;

    // Dropping the exchange on timeout aborts the connection.
    let exchange = async {
      let response = self.client.execute(request).await?;
      let status = response.status();
      let body = response.text().await?;
      Ok::<_, reqwest::Error>((status, body))
    };

    let (status, body) = tokio::time::timeout(config.timeout, exchange)
      .await
      .map_err(|_| FetchError::Timeout(config.timeout))??;

    if !status.is_success() {
      return Err(FetchError::Status(status));
    }
    if looks_like_html(&body) {
      return Err(FetchError::HtmlResponse);
    }

    Ok(FetchResponse {
      success: true,
      status: status.as_u16(),
      body,
    })
  }
}
