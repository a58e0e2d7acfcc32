//! In-process HTTP responder for fetcher and loader tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A canned response served for one request.
#[derive(Debug, Clone)]
pub struct StubResponse {
  status: u16,
  body: String,
  delay: Duration,
}

impl StubResponse {
  pub fn ok(body: &str) -> Self {
    Self::status(200, body)
  }

  pub fn status(status: u16, body: &str) -> Self {
    Self {
      status,
      body: body.to_string(),
      delay: Duration::ZERO,
    }
  }

  /// Wait before answering
  pub fn delayed(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  fn render(&self) -> String {
    let reason = if self.status == 200 { "OK" } else { "Error" };
    format!(
      "HTTP/1.1 {} {}\r\nContent-Type: text/csv; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      self.status,
      reason,
      self.body.len(),
      self.body
    )
  }
}

/// Serves the given responses in order, one per connection.
/// The last response repeats once the list is exhausted.
pub struct StubServer {
  pub url: String,
  hits: Arc<AtomicUsize>,
}

impl StubServer {
  pub async fn start(responses: Vec<StubResponse>) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/export.csv", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    tokio::spawn(async move {
      while let Ok((mut socket, _)) = listener.accept().await {
        let index = counter.fetch_add(1, Ordering::SeqCst);
        let response = responses
          .get(index)
          .or_else(|| responses.last())
          .cloned()
          .unwrap_or_else(|| StubResponse::status(500, ""));

        tokio::spawn(async move {
          let mut request = Vec::new();
          let mut buf = [0u8; 1024];
          while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
              Ok(0) | Err(_) => return,
              Ok(n) => request.extend_from_slice(&buf[..n]),
            }
          }
          tokio::time::sleep(response.delay).await;
          let _ = socket.write_all(response.render().as_bytes()).await;
          let _ = socket.shutdown().await;
        });
      }
    });

    Self { url, hits }
  }

  /// Number of requests received so far
  pub fn hits(&self) -> usize {
    self.hits.load(Ordering::SeqCst)
  }
}
