use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::managed::shared::Shared;
use crate::state::StopOutcome;
use crate::task::{Context, Task};

/// The OS thread backing one run of a managed thread.
pub(crate) struct Worker {
  handle: JoinHandle<()>, // Dropping the handle detaches the thread.
  generation: u64,
}

impl Worker {
  /// Spawns a worker thread for run `generation`.
  pub(crate) fn spawn(
    builder: thread::Builder,
    shared: Arc<Shared>,
    task: Arc<dyn Task>,
    name: Arc<str>,
    generation: u64,
  ) -> io::Result<Self> {
    let handle = builder.spawn(move || Self::run(shared, task, name, generation))?;
    Ok(Self { handle, generation })
  }

  /// The main loop: one `run_once` per step until the run is stopped.
  fn run(shared: Arc<Shared>, task: Arc<dyn Task>, name: Arc<str>, generation: u64) {
    // Reports Stopped on the way out, also when the task body panics.
    let _exit = ExitGuard {
      shared: Arc::clone(&shared),
      generation,
    };

    let mut ctx = Context::new(Arc::clone(&shared), name, generation);
    let mut iteration = 0;
    while shared.enter_step(generation) {
      ctx.set_iteration(iteration);
      task.run_once(&ctx);
      iteration += 1;
    }
    tracing::trace!(thread = ctx.name(), generation, iterations = iteration, "worker loop exited");
  }

  pub(crate) fn generation(&self) -> u64 {
    self.generation
  }

  pub(crate) fn name(&self) -> Option<&str> {
    self.handle.thread().name()
  }

  pub(crate) fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }

  /// Waits for the thread to exit.
  pub(crate) fn join(self) -> StopOutcome {
    let name = self.name().unwrap_or_default().to_owned();
    match self.handle.join() {
      Ok(()) => StopOutcome::Graceful,
      Err(_) => {
        tracing::warn!(thread = %name, generation = self.generation, "task body panicked");
        StopOutcome::Panicked
      }
    }
  }
}

struct ExitGuard {
  shared: Arc<Shared>,
  generation: u64,
}

impl Drop for ExitGuard {
  fn drop(&mut self) {
    self.shared.finish(self.generation);
  }
}
