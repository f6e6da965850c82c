//! The task body a [`ManagedThread`](crate::ManagedThread) runs, and the
//! [`Context`] it is handed on every step.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::managed::shared::Shared;
use crate::state::ThreadState;
use crate::sync_util::Deadline;

/// One unit of work, invoked repeatedly by a managed worker thread.
///
/// The worker calls [`run_once`](Task::run_once) in a loop for as long as the
/// thread is running. Between steps it honours pause and stop requests by
/// itself; a step that runs for a long time should check
/// [`Context::should_stop`] at safe points so that `stop` can complete
/// without abandoning the thread.
///
/// Closures taking `&Context` implement `Task`:
///
/// ```
/// use fibre_thread::{Context, ManagedThread};
/// use std::time::Duration;
///
/// let mut worker = ManagedThread::new(|ctx: &Context| {
///   ctx.sleep(Duration::from_millis(10));
/// });
/// worker.start("ticker").unwrap();
/// worker.stop(Duration::from_secs(1));
/// ```
pub trait Task: Send + Sync + 'static {
  fn run_once(&self, ctx: &Context);
}

impl<F> Task for F
where
  F: Fn(&Context) + Send + Sync + 'static,
{
  #[inline]
  fn run_once(&self, ctx: &Context) {
    self(ctx)
  }
}

/// The worker's view of its own lifecycle, passed to every [`Task::run_once`].
///
/// A context belongs to one run of the thread (one `start`). Once that run is
/// stopped or abandoned, [`should_stop`](Self::should_stop) reports `true`
/// for good, even if the instance has since been restarted.
pub struct Context {
  shared: Arc<Shared>,
  name: Arc<str>,
  generation: u64,
  iteration: u64,
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("name", &self.name)
      .field("generation", &self.generation)
      .field("iteration", &self.iteration)
      .finish()
  }
}

impl Context {
  pub(crate) fn new(shared: Arc<Shared>, name: Arc<str>, generation: u64) -> Self {
    Self {
      shared,
      name,
      generation,
      iteration: 0,
    }
  }

  pub(crate) fn set_iteration(&mut self, iteration: u64) {
    self.iteration = iteration;
  }

  /// The name the thread was started with.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Zero-based count of `run_once` calls made before this one in this run.
  pub fn iteration(&self) -> u64 {
    self.iteration
  }

  /// Returns `true` once a stop has been requested for this run.
  pub fn should_stop(&self) -> bool {
    self.shared.is_retired(self.generation)
  }

  /// Returns `true` while a pause is requested. The worker idles on its own
  /// between steps; long-running steps may check this to yield early.
  pub fn is_paused(&self) -> bool {
    !self.should_stop() && self.shared.control() == ThreadState::Paused
  }

  /// Sleeps for `duration`, waking early if a stop is requested.
  ///
  /// Returns `true` if the full duration elapsed and `false` if the sleep was
  /// cut short by a stop request.
  pub fn sleep(&self, duration: Duration) -> bool {
    self
      .shared
      .sleep_unless_retired(self.generation, Deadline::after(duration))
  }
}
