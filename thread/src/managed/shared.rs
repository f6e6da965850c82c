use parking_lot::{Condvar, Mutex};

use crate::state::ThreadState;
use crate::sync_util::{self, Deadline};

/// Control and status flags of a managed thread.
///
/// `generation` identifies the current run. Every `start` begins a new one,
/// and retiring a run (stop, abandon, failed spawn) moves it on again, so a
/// worker from an older run can tell it has been superseded and can no
/// longer overwrite `status`.
#[derive(Debug)]
struct Flags {
  control: ThreadState,
  status: ThreadState,
  generation: u64,
}

/// State shared between a `ManagedThread`, its controllers and its worker.
#[derive(Debug)]
pub(crate) struct Shared {
  flags: Mutex<Flags>,
  changed: Condvar,
}

impl Shared {
  pub(crate) fn new() -> Self {
    Self {
      flags: Mutex::new(Flags {
        control: ThreadState::Stopped,
        status: ThreadState::Stopped,
        generation: 0,
      }),
      changed: Condvar::new(),
    }
  }

  pub(crate) fn status(&self) -> ThreadState {
    self.flags.lock().status
  }

  pub(crate) fn control(&self) -> ThreadState {
    self.flags.lock().control
  }

  // --- Caller side ---

  /// Opens a new run and requests `Running`. Returns the run's generation.
  pub(crate) fn begin_run(&self) -> u64 {
    let mut flags = self.flags.lock();
    flags.generation += 1;
    flags.control = ThreadState::Running;
    flags.generation
  }

  /// Requests a pause. Only takes effect while the worker is running and no
  /// other request is pending; the status flips to `Paused` immediately.
  pub(crate) fn pause(&self) -> bool {
    let mut flags = self.flags.lock();
    if flags.status != ThreadState::Running || flags.control != ThreadState::Running {
      return false;
    }
    flags.control = ThreadState::Paused;
    flags.status = ThreadState::Paused;
    self.changed.notify_all();
    true
  }

  /// Requests that a paused worker run again. The worker reports `Running`
  /// itself once it picks the request up.
  pub(crate) fn resume(&self) -> bool {
    let mut flags = self.flags.lock();
    if flags.status != ThreadState::Paused || flags.control != ThreadState::Paused {
      return false;
    }
    flags.control = ThreadState::Running;
    self.changed.notify_all();
    true
  }

  /// Requests that the worker leave its loop. Wakes a paused worker.
  pub(crate) fn request_stop(&self) {
    let mut flags = self.flags.lock();
    flags.control = ThreadState::Stopped;
    self.changed.notify_all();
  }

  /// Ends run `generation` from the caller's side: the status becomes
  /// `Stopped` and a worker still executing that run is cut off.
  pub(crate) fn retire(&self, generation: u64) {
    let mut flags = self.flags.lock();
    if flags.generation != generation {
      return;
    }
    flags.generation += 1;
    flags.control = ThreadState::Stopped;
    flags.status = ThreadState::Stopped;
    self.changed.notify_all();
  }

  /// Blocks until the status equals `target` or the deadline passes.
  pub(crate) fn wait_for_status(&self, target: ThreadState, deadline: Deadline) -> bool {
    let mut flags = self.flags.lock();
    sync_util::wait_until(&self.changed, &mut flags, deadline, |f| f.status == target)
  }

  // --- Worker side ---

  /// Returns `true` if run `generation` has been stopped or superseded.
  pub(crate) fn is_retired(&self, generation: u64) -> bool {
    let flags = self.flags.lock();
    flags.generation != generation || flags.control == ThreadState::Stopped
  }

  /// Called by the worker before each step. Reports `Running` and returns
  /// `true` if the task body should run; idles while paused; returns `false`
  /// once the run is over.
  pub(crate) fn enter_step(&self, generation: u64) -> bool {
    let mut flags = self.flags.lock();
    loop {
      if flags.generation != generation {
        return false;
      }
      match flags.control {
        ThreadState::Stopped => return false,
        ThreadState::Running => {
          if flags.status != ThreadState::Running {
            flags.status = ThreadState::Running;
            self.changed.notify_all();
          }
          return true;
        }
        ThreadState::Paused => self.changed.wait(&mut flags),
      }
    }
  }

  /// Called by the worker as it leaves its loop, including by unwinding.
  pub(crate) fn finish(&self, generation: u64) {
    let mut flags = self.flags.lock();
    if flags.generation != generation {
      return;
    }
    flags.status = ThreadState::Stopped;
    self.changed.notify_all();
  }

  /// Sleeps until the deadline, returning early with `false` if run
  /// `generation` is stopped or superseded in the meantime.
  pub(crate) fn sleep_unless_retired(&self, generation: u64, deadline: Deadline) -> bool {
    let mut flags = self.flags.lock();
    let retired = sync_util::wait_until(&self.changed, &mut flags, deadline, |f| {
      f.generation != generation || f.control == ThreadState::Stopped
    });
    !retired
  }
}
