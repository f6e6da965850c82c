// src/error.rs

use thiserror::Error;

/// Error returned by [`ManagedThread::start`](crate::ManagedThread::start)
/// when no worker could be started.
///
/// This is the only failure the lifecycle API surfaces. Timeouts and
/// out-of-order `pause`/`resume` calls are degraded outcomes, not errors.
#[derive(Debug, Error)]
pub enum StartError {
  /// This instance already owns a worker. Call `stop` before starting again.
  #[error("thread is already running")]
  AlreadyRunning,

  /// The requested name is longer than [`MAX_NAME_LEN`](crate::MAX_NAME_LEN) bytes.
  #[error("thread name is {len} bytes, the limit is {max}")]
  NameTooLong { len: usize, max: usize },

  /// The requested name contains an interior NUL byte.
  #[error("thread name may not contain NUL bytes")]
  InvalidName,

  /// The operating system refused to create the thread.
  #[error("failed to spawn thread: {0}")]
  Spawn(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_problem() {
    assert_eq!(StartError::AlreadyRunning.to_string(), "thread is already running");
    assert_eq!(
      StartError::NameTooLong { len: 80, max: 63 }.to_string(),
      "thread name is 80 bytes, the limit is 63"
    );
  }

  #[test]
  fn io_errors_convert_to_spawn() {
    let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no stack");
    let err: StartError = io.into();
    assert!(matches!(err, StartError::Spawn(_)));
    assert!(err.to_string().starts_with("failed to spawn thread"));
  }
}
