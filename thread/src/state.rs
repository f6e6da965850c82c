use std::fmt;

/// The lifecycle state of a managed worker thread.
///
/// The same type describes both sides of the lifecycle handshake: the state a
/// caller has *requested* (the control flag) and the state the worker has
/// actually *reached* (the status flag). The two may disagree for a short
/// while; the worker reconciles them on its own schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThreadState {
  /// The worker is looping over its task body.
  Running,
  /// The worker is idle and will not invoke its task body until resumed.
  Paused,
  /// No worker is running, or the worker has left its loop.
  #[default]
  Stopped,
}

impl ThreadState {
  #[inline]
  pub fn is_running(self) -> bool {
    self == ThreadState::Running
  }

  #[inline]
  pub fn is_paused(self) -> bool {
    self == ThreadState::Paused
  }

  #[inline]
  pub fn is_stopped(self) -> bool {
    self == ThreadState::Stopped
  }
}

impl fmt::Display for ThreadState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ThreadState::Running => write!(f, "running"),
      ThreadState::Paused => write!(f, "paused"),
      ThreadState::Stopped => write!(f, "stopped"),
    }
  }
}

/// How a call to [`ManagedThread::stop`](crate::ManagedThread::stop) ended.
///
/// None of these are errors. Every outcome leaves the instance without an
/// owned worker, ready for another `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
  /// The worker observed the stop request, left its loop and was joined.
  Graceful,
  /// The worker did not leave its loop before the timeout elapsed. Its run
  /// was retired and the OS thread detached; the task body can still notice
  /// through [`Context::should_stop`](crate::Context::should_stop).
  Abandoned,
  /// The task body panicked. The thread has been joined.
  Panicked,
  /// There was no worker to stop.
  NotRunning,
}

impl fmt::Display for StopOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StopOutcome::Graceful => write!(f, "stopped gracefully"),
      StopOutcome::Abandoned => write!(f, "stop timed out, worker abandoned"),
      StopOutcome::Panicked => write!(f, "worker panicked"),
      StopOutcome::NotRunning => write!(f, "worker was not running"),
    }
  }
}
