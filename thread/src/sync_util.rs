//! Utilities for bounded blocking waits.
//! Lifecycle calls take a caller timeout; these helpers turn it into a
//! deadline and wait on a condition variable until a predicate holds.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};

/// The instant after which a blocking wait gives up.
///
/// An unbounded deadline never expires. A timeout too large to represent as an
/// `Instant` is treated as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
  #[inline]
  pub(crate) fn after(timeout: Duration) -> Self {
    Self(Instant::now().checked_add(timeout))
  }

  #[inline]
  pub(crate) fn unbounded() -> Self {
    Self(None)
  }

  /// Like [`Deadline::after`], except that `Duration::ZERO` means "no limit".
  #[inline]
  pub(crate) fn zero_is_unbounded(timeout: Duration) -> Self {
    if timeout.is_zero() {
      Self::unbounded()
    } else {
      Self::after(timeout)
    }
  }
}

/// Blocks on `cond` until `done` holds for the guarded value or `deadline`
/// passes. Spurious wakeups re-check the predicate.
///
/// Returns the last value of `done`.
pub(crate) fn wait_until<T, F>(
  cond: &Condvar,
  guard: &mut MutexGuard<'_, T>,
  deadline: Deadline,
  mut done: F,
) -> bool
where
  F: FnMut(&T) -> bool,
{
  while !done(&**guard) {
    match deadline.0 {
      None => cond.wait(guard),
      Some(at) => {
        if cond.wait_until(guard, at).timed_out() {
          return done(&**guard);
        }
      }
    }
  }
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use parking_lot::Mutex;
  use std::sync::Arc;
  use std::thread;

  #[test]
  fn zero_timeout_is_unbounded_only_when_asked() {
    assert_eq!(Deadline::zero_is_unbounded(Duration::ZERO), Deadline::unbounded());
    assert_ne!(Deadline::after(Duration::ZERO), Deadline::unbounded());
  }

  #[test]
  fn huge_timeout_saturates_to_unbounded() {
    assert_eq!(Deadline::after(Duration::MAX), Deadline::unbounded());
  }

  #[test]
  fn wait_until_times_out() {
    let lock = Mutex::new(false);
    let cond = Condvar::new();
    let mut guard = lock.lock();
    let start = Instant::now();
    let done = wait_until(&cond, &mut guard, Deadline::after(Duration::from_millis(50)), |v| *v);
    assert!(!done);
    assert!(start.elapsed() >= Duration::from_millis(50));
  }

  #[test]
  fn wait_until_wakes_on_notify() {
    let shared = Arc::new((Mutex::new(false), Condvar::new()));
    let setter = shared.clone();
    let handle = thread::spawn(move || {
      thread::sleep(Duration::from_millis(50));
      *setter.0.lock() = true;
      setter.1.notify_all();
    });

    let mut guard = shared.0.lock();
    let done = wait_until(&shared.1, &mut guard, Deadline::unbounded(), |v| *v);
    assert!(done);
    drop(guard);
    handle.join().unwrap();
  }
}
