//! Background work whose result the UI picks up on a tick.
//!
//! ```ignore
//! let loader = loader.clone();
//! let mut task = Task::spawn(async move { loader.load().await.map_err(|e| e.to_string()) });
//!
//! // In the event loop tick
//! if task.poll() {
//!     if let Some(result) = task.take() { /* ... */ }
//! }
//! ```

use std::future::Future;
use tokio::sync::oneshot;

/// Where a task stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState<T> {
  Running,
  Done(T),
  Failed(String),
  /// The result has been taken out
  Consumed,
}

/// A spawned future and the channel its result arrives on.
#[derive(Debug)]
pub struct Task<T> {
  state: TaskState<T>,
  receiver: Option<oneshot::Receiver<Result<T, String>>>,
}

impl<T: Send + 'static> Task<T> {
  /// Spawn `future` on the runtime.
  pub fn spawn<Fut>(future: Fut) -> Self
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      // Receiver may have been dropped
      let _ = tx.send(future.await);
    });

    Self {
      state: TaskState::Running,
      receiver: Some(rx),
    }
  }

  #[cfg(test)]
  pub fn state(&self) -> &TaskState<T> {
    &self.state
  }

  pub fn is_running(&self) -> bool {
    matches!(self.state, TaskState::Running)
  }

  #[cfg(test)]
  pub fn error(&self) -> Option<&str> {
    match &self.state {
      TaskState::Failed(e) => Some(e),
      _ => None,
    }
  }

  /// Check for a result without blocking.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return false;
    };

    match receiver.try_recv() {
      Ok(result) => {
        self.state = match result {
          Ok(value) => TaskState::Done(value),
          Err(e) => TaskState::Failed(e),
        };
        self.receiver = None;
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => false,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.state = TaskState::Failed("background task ended without a result".to_string());
        self.receiver = None;
        true
      }
    }
  }

  /// Move a finished result out, leaving the task consumed.
  pub fn take(&mut self) -> Option<Result<T, String>> {
    match std::mem::replace(&mut self.state, TaskState::Consumed) {
      TaskState::Done(value) => Some(Ok(value)),
      TaskState::Failed(e) => Some(Err(e)),
      other => {
        self.state = other;
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_task_success() {
    let mut task = Task::spawn(async { Ok::<_, String>(vec![1, 2, 3]) });
    assert!(task.is_running());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(task.poll());
    assert_eq!(task.state(), &TaskState::Done(vec![1, 2, 3]));
    assert_eq!(task.take(), Some(Ok(vec![1, 2, 3])));
    assert_eq!(task.state(), &TaskState::Consumed);
    assert_eq!(task.take(), None);
  }

  #[tokio::test]
  async fn test_task_error() {
    let mut task: Task<i32> = Task::spawn(async { Err("gave up after 5 attempts".to_string()) });

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(task.poll());
    assert_eq!(task.error(), Some("gave up after 5 attempts"));
    assert!(!task.poll());
  }

  #[tokio::test]
  async fn test_running_task_cannot_be_taken() {
    let mut task = Task::spawn(async {
      tokio::time::sleep(Duration::from_millis(200)).await;
      Ok::<_, String>(42)
    });

    assert!(!task.poll());
    assert_eq!(task.take(), None);
    assert!(task.is_running());
  }

  #[tokio::test]
  async fn test_panicked_task_reports_failure() {
    let mut task: Task<i32> = Task::spawn(async {
      let fail = true;
      if fail {
        panic!("boom");
      }
      Ok(1)
    });

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(task.poll());
    assert!(task.error().is_some());
  }
}
