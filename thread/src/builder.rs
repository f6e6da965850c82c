use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::managed::ManagedThread;
use crate::task::Task;

/// How long dropping a running `ManagedThread` waits for its worker by default.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// A builder for creating [`ManagedThread`] instances.
///
/// ```
/// use fibre_thread::{Context, ThreadBuilder};
/// use std::time::Duration;
///
/// let worker = ThreadBuilder::new()
///   .stack_size(256 * 1024)
///   .shutdown_timeout(Duration::from_millis(500))
///   .build(|ctx: &Context| {
///     ctx.sleep(Duration::from_millis(10));
///   });
/// assert!(worker.name().is_empty());
/// ```
#[derive(Clone)]
pub struct ThreadBuilder {
  stack_size: Option<usize>,
  shutdown_timeout: Duration,
}

impl fmt::Debug for ThreadBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ThreadBuilder")
      .field("stack_size", &self.stack_size)
      .field("shutdown_timeout", &self.shutdown_timeout)
      .finish()
  }
}

impl ThreadBuilder {
  /// Creates a builder with the platform's default stack size and a
  /// [`DEFAULT_SHUTDOWN_TIMEOUT`] for drops.
  pub fn new() -> Self {
    Self {
      stack_size: None,
      shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
    }
  }

  /// Sets the stack size of the worker thread, in bytes.
  ///
  /// Defaults to whatever `std::thread` uses if not set.
  pub fn stack_size(mut self, bytes: usize) -> Self {
    self.stack_size = Some(bytes);
    self
  }

  /// Sets how long dropping a running `ManagedThread` waits for its worker
  /// before abandoning it. `Duration::ZERO` abandons immediately.
  pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
    self.shutdown_timeout = timeout;
    self
  }

  /// Builds a stopped `ManagedThread` that runs `task` once started.
  pub fn build<T: Task>(self, task: T) -> ManagedThread {
    self.build_shared(Arc::new(task))
  }

  /// Like [`build`](Self::build), for a task that is already shared.
  pub fn build_shared(self, task: Arc<dyn Task>) -> ManagedThread {
    ManagedThread::from_builder(task, self.stack_size, self.shutdown_timeout)
  }
}

impl Default for ThreadBuilder {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::ThreadState;
  use crate::task::Context;

  #[test]
  fn defaults() {
    let builder = ThreadBuilder::default();
    assert_eq!(builder.stack_size, None);
    assert_eq!(builder.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
  }

  #[test]
  fn settings_are_kept() {
    let builder = ThreadBuilder::new()
      .stack_size(64 * 1024)
      .shutdown_timeout(Duration::ZERO);
    assert_eq!(builder.stack_size, Some(64 * 1024));
    assert_eq!(builder.shutdown_timeout, Duration::ZERO);
  }

  #[test]
  fn built_thread_is_stopped_and_unnamed() {
    let worker = ThreadBuilder::new().build(|_: &Context| {});
    assert_eq!(worker.status(), ThreadState::Stopped);
    assert_eq!(worker.name(), "");
  }

  #[test]
  fn custom_stack_size_starts() {
    let mut worker = ThreadBuilder::new()
      .stack_size(128 * 1024)
      .build(|ctx: &Context| {
        ctx.sleep(Duration::from_millis(5));
      });
    worker.start("small-stack").unwrap();
    assert!(worker.wait_until_ready(Duration::from_secs(2)));
    assert_eq!(
      worker.stop(Duration::from_secs(2)),
      crate::state::StopOutcome::Graceful
    );
  }
}
