//! The managed worker thread and its lifecycle state machine.
//!
//! A [`ManagedThread`] owns at most one OS thread at a time. `start` spawns it
//! and the worker loops over the task body; `pause` and `resume` toggle the
//! loop; `stop` asks the worker to leave and waits for it with a timeout.
//!
//! Two flags describe the lifecycle. The *control* flag is what callers have
//! asked for; the *status* flag is what the worker has actually reached. The
//! worker reconciles the two between steps, so observers see a requested
//! change with a short delay rather than instantly.

pub(crate) mod shared;
mod worker;

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::builder::ThreadBuilder;
use crate::error::StartError;
use crate::state::{StopOutcome, ThreadState};
use crate::sync_util::Deadline;
use crate::task::Task;

use shared::Shared;
use worker::Worker;

/// Longest accepted thread name, in bytes.
pub const MAX_NAME_LEN: usize = 63;

/// A single worker thread with start/pause/resume/stop lifecycle control.
///
/// ```
/// use fibre_thread::{Context, ManagedThread, StopOutcome, ThreadState};
/// use std::time::Duration;
///
/// let mut worker = ManagedThread::new(|ctx: &Context| {
///   ctx.sleep(Duration::from_millis(5));
/// });
/// assert_eq!(worker.status(), ThreadState::Stopped);
///
/// worker.start("worker").unwrap();
/// assert!(worker.wait_until_ready(Duration::from_secs(1)));
///
/// worker.pause();
/// assert_eq!(worker.status(), ThreadState::Paused);
/// worker.resume();
/// assert!(worker.wait_until_ready(Duration::from_secs(1)));
///
/// assert_eq!(worker.stop(Duration::from_secs(2)), StopOutcome::Graceful);
/// assert_eq!(worker.status(), ThreadState::Stopped);
/// ```
///
/// Dropping a `ManagedThread` that still owns a worker stops it with the
/// builder's shutdown timeout.
pub struct ManagedThread {
  name: String,
  task: Arc<dyn Task>,
  shared: Arc<Shared>,
  worker: Option<Worker>,
  stack_size: Option<usize>,
  shutdown_timeout: Duration,
}

impl fmt::Debug for ManagedThread {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ManagedThread")
      .field("name", &self.name)
      .field("status", &self.shared.status())
      .field("control", &self.shared.control())
      .field("has_worker", &self.worker.is_some())
      .finish_non_exhaustive()
  }
}

impl ManagedThread {
  /// Creates a stopped thread that will run `task` once started.
  pub fn new<T: Task>(task: T) -> Self {
    ThreadBuilder::new().build(task)
  }

  /// Returns a builder for configuring stack size and shutdown behaviour.
  pub fn builder() -> ThreadBuilder {
    ThreadBuilder::new()
  }

  pub(crate) fn from_builder(task: Arc<dyn Task>, stack_size: Option<usize>, shutdown_timeout: Duration) -> Self {
    Self {
      name: String::new(),
      task,
      shared: Arc::new(Shared::new()),
      worker: None,
      stack_size,
      shutdown_timeout,
    }
  }

  /// Spawns the worker thread under `name`.
  ///
  /// The name is assigned only if the thread starts. Fails if this instance
  /// already owns a worker, if the name is invalid, or if the OS cannot
  /// create the thread.
  pub fn start(&mut self, name: &str) -> Result<(), StartError> {
    if let Some(worker) = &self.worker {
      if !worker.is_finished() {
        return Err(StartError::AlreadyRunning);
      }
    }
    // A previous worker that already left (stop requested through a
    // controller, or a panic) is reaped here.
    if let Some(worker) = self.worker.take() {
      let _ = worker.join();
    }

    validate_name(name)?;

    let generation = self.shared.begin_run();
    let mut builder = thread::Builder::new().name(name.to_owned());
    if let Some(size) = self.stack_size {
      builder = builder.stack_size(size);
    }

    match Worker::spawn(
      builder,
      Arc::clone(&self.shared),
      Arc::clone(&self.task),
      Arc::from(name),
      generation,
    ) {
      Ok(worker) => {
        self.worker = Some(worker);
        self.name.clear();
        self.name.push_str(name);
        tracing::debug!(thread = name, generation, "worker started");
        Ok(())
      }
      Err(e) => {
        self.shared.retire(generation);
        tracing::error!(thread = name, error = %e, "failed to start worker");
        Err(StartError::Spawn(e))
      }
    }
  }

  /// Stops the worker, waiting up to `timeout` for it to leave its loop.
  ///
  /// If the worker has not reported `Stopped` when the timeout elapses (with a
  /// zero `timeout`, right away), the run is abandoned: its status is forced to
  /// `Stopped` and the OS thread is detached. An abandoned task body can
  /// still observe the stop through [`Context::should_stop`](crate::Context::should_stop).
  ///
  /// Every path releases the worker, so the instance can be started again.
  pub fn stop(&mut self, timeout: Duration) -> StopOutcome {
    self.shared.request_stop();
    let Some(worker) = self.worker.take() else {
      return StopOutcome::NotRunning;
    };

    // A zero timeout still joins a worker that has already reported Stopped;
    // it is past its loop, so the join is bounded.
    let left = self
      .shared
      .wait_for_status(ThreadState::Stopped, Deadline::after(timeout));

    if left {
      let outcome = worker.join();
      tracing::debug!(thread = %self.name, %outcome, "worker stopped");
      return outcome;
    }

    self.shared.retire(worker.generation());
    tracing::warn!(
      thread = %self.name,
      ?timeout,
      "worker did not stop in time; abandoning thread"
    );
    // Dropping the handle detaches the thread.
    drop(worker);
    StopOutcome::Abandoned
  }

  /// Pauses a running worker. Does nothing unless the status is `Running`.
  ///
  /// The status becomes `Paused` immediately. A step already in progress
  /// completes; the worker then idles until resumed or stopped.
  pub fn pause(&self) {
    if !self.shared.pause() {
      tracing::trace!(thread = %self.name, "pause ignored, worker not running");
    }
  }

  /// Resumes a paused worker. Does nothing unless the status is `Paused`.
  ///
  /// The status returns to `Running` once the worker picks the request up.
  pub fn resume(&self) {
    if !self.shared.resume() {
      tracing::trace!(thread = %self.name, "resume ignored, worker not paused");
    }
  }

  /// The state the worker has reached.
  pub fn status(&self) -> ThreadState {
    self.shared.status()
  }

  pub fn is_running(&self) -> bool {
    self.status().is_running()
  }

  /// The name given to the last successful `start`; empty before that.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Blocks until the worker reports `Running`, for at most `timeout`.
  /// `Duration::ZERO` waits without limit.
  ///
  /// Returns whether `Running` was observed. A timeout is not an error; the
  /// caller decides what to do with the current [`status`](Self::status).
  pub fn wait_until_ready(&self, timeout: Duration) -> bool {
    self
      .shared
      .wait_for_status(ThreadState::Running, Deadline::zero_is_unbounded(timeout))
  }

  /// Returns a cloneable handle for controlling the worker from other threads.
  pub fn controller(&self) -> Controller {
    Controller {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl Drop for ManagedThread {
  fn drop(&mut self) {
    if self.worker.is_some() {
      let _ = self.stop(self.shutdown_timeout);
    }
  }
}

/// A cloneable handle to the lifecycle flags of a [`ManagedThread`].
///
/// Controllers can pause, resume, observe and request a stop from any thread.
/// Only the owning `ManagedThread` can start the worker or join it.
#[derive(Clone)]
pub struct Controller {
  shared: Arc<Shared>,
}

impl fmt::Debug for Controller {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Controller")
      .field("status", &self.shared.status())
      .finish()
  }
}

impl Controller {
  /// See [`ManagedThread::pause`].
  pub fn pause(&self) {
    self.shared.pause();
  }

  /// See [`ManagedThread::resume`].
  pub fn resume(&self) {
    self.shared.resume();
  }

  pub fn status(&self) -> ThreadState {
    self.shared.status()
  }

  /// See [`ManagedThread::wait_until_ready`].
  pub fn wait_until_ready(&self, timeout: Duration) -> bool {
    self
      .shared
      .wait_for_status(ThreadState::Running, Deadline::zero_is_unbounded(timeout))
  }

  /// Asks the worker to leave its loop without waiting for it. The owning
  /// `ManagedThread` joins it on the next `stop` or `start`.
  pub fn request_stop(&self) {
    self.shared.request_stop();
  }

  /// Blocks until the worker reports `Stopped`, for at most `timeout`.
  /// `Duration::ZERO` waits without limit.
  pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
    self
      .shared
      .wait_for_status(ThreadState::Stopped, Deadline::zero_is_unbounded(timeout))
  }
}

fn validate_name(name: &str) -> Result<(), StartError> {
  if name.len() > MAX_NAME_LEN {
    return Err(StartError::NameTooLong {
      len: name.len(),
      max: MAX_NAME_LEN,
    });
  }
  if name.contains('\0') {
    return Err(StartError::InvalidName);
  }
  Ok(())
}
