//! A binary semaphore that supports both synchronous and asynchronous waiters.
//!
//! `Semaphore` starts with a single permit and never holds more than one, so
//! it works as a mutex substitute or as a readiness signal passed between a
//! managed worker and the rest of the program. Its state is protected by a
//! `parking_lot::Mutex`. Blocked callers (parked threads and async tasks) wait
//! in one FIFO queue, and `unlock` hands the permit straight to the first of
//! them, so a newly arriving caller can never steal it from a waiter.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread::{self, Thread};

use parking_lot::Mutex;

use crate::async_util::AtomicWaker;

/// The semaphore never holds more permits than this.
const MAX_PERMITS: usize = 1;

/// How a queued waiter is woken once it has been handed the permit.
enum Wake {
  Thread(Thread),
  Task(AtomicWaker),
}

/// A queued waiter. `granted` flips to `true` when `unlock` hands it the permit.
struct Waiter {
  granted: AtomicBool,
  wake: Wake,
}

impl Waiter {
  fn for_thread(thread: Thread) -> Arc<Self> {
    Arc::new(Self {
      granted: AtomicBool::new(false),
      wake: Wake::Thread(thread),
    })
  }

  fn for_task(waker: &Waker) -> Arc<Self> {
    let atomic = AtomicWaker::new();
    atomic.register(waker);
    Arc::new(Self {
      granted: AtomicBool::new(false),
      wake: Wake::Task(atomic),
    })
  }

  #[inline]
  fn is_granted(&self) -> bool {
    self.granted.load(Ordering::Acquire)
  }

  /// Refreshes the waker of an async waiter. No-op for threads.
  fn register(&self, waker: &Waker) {
    if let Wake::Task(atomic) = &self.wake {
      atomic.register(waker);
    }
  }

  /// Hands the permit to this waiter and wakes it.
  fn grant(&self) {
    self.granted.store(true, Ordering::Release);
    match &self.wake {
      Wake::Thread(thread) => thread.unpark(),
      Wake::Task(atomic) => atomic.wake(),
    }
  }
}

/// The internal state of the `Semaphore`, protected by a `Mutex`.
///
/// `permits > 0` implies `waiters` is empty: a release with waiters queued
/// goes to a waiter, never to the count.
struct SemaphoreState {
  permits: usize,
  waiters: VecDeque<Arc<Waiter>>,
}

/// A binary semaphore with one permit.
///
/// ```
/// use fibre_thread::Semaphore;
///
/// let sem = Semaphore::new();
/// assert!(!sem.is_locked());
/// sem.lock();
/// assert!(sem.is_locked());
/// sem.unlock();
/// assert!(!sem.is_locked());
/// ```
pub struct Semaphore {
  state: Mutex<SemaphoreState>,
}

impl fmt::Debug for Semaphore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("Semaphore")
      .field("permits", &state.permits)
      .field("waiters", &state.waiters.len())
      .finish()
  }
}

impl Default for Semaphore {
  fn default() -> Self {
    Self::new()
  }
}

impl Semaphore {
  /// Creates a semaphore with its single permit available.
  pub fn new() -> Self {
    Self {
      state: Mutex::new(SemaphoreState {
        permits: MAX_PERMITS,
        waiters: VecDeque::new(),
      }),
    }
  }

  /// Acquires the permit, blocking the current thread until it is available.
  pub fn lock(&self) {
    let waiter = {
      let mut state = self.state.lock();
      if state.permits > 0 {
        state.permits -= 1;
        return;
      }
      let waiter = Waiter::for_thread(thread::current());
      state.waiters.push_back(Arc::clone(&waiter));
      waiter
    };

    // Unparks can be spurious; only a grant ends the wait.
    while !waiter.is_granted() {
      thread::park();
    }
  }

  /// Attempts to acquire the permit without blocking.
  ///
  /// Fails whenever the permit is held, which includes the moment right after
  /// `unlock` handed it to a queued waiter.
  pub fn try_lock(&self) -> bool {
    let mut state = self.state.lock();
    if state.permits > 0 {
      state.permits -= 1;
      true
    } else {
      false
    }
  }

  /// Acquires the permit and returns a guard that releases it on drop.
  pub fn acquire(&self) -> SemaphoreGuard<'_> {
    self.lock();
    SemaphoreGuard { semaphore: self }
  }

  /// Acquires the permit asynchronously.
  ///
  /// The returned future resolves once the caller holds the permit; release
  /// it with [`unlock`](Self::unlock). Dropping the future before it resolves
  /// gives up the place in the queue without leaking the permit.
  pub fn lock_async(&self) -> LockFuture<'_> {
    LockFuture {
      semaphore: self,
      waiter: None,
      acquired: false,
    }
  }

  /// Releases the permit, waking the longest-waiting caller if there is one.
  ///
  /// Releasing a semaphore that is not held is a caller bug. It is reported
  /// through `tracing` and otherwise ignored, so the count never exceeds one.
  pub fn unlock(&self) {
    let mut state = self.state.lock();
    if let Some(waiter) = state.waiters.pop_front() {
      // The permit passes straight to the waiter; the count stays at zero.
      waiter.grant();
      return;
    }
    if state.permits >= MAX_PERMITS {
      tracing::warn!("semaphore unlocked while not held; ignoring");
      return;
    }
    state.permits += 1;
  }

  /// Returns `true` if the permit is currently held.
  ///
  /// This is a point-in-time observation that may be stale by the time the
  /// caller acts on it. Use it for diagnostics, not for synchronisation.
  pub fn is_locked(&self) -> bool {
    self.state.lock().permits == 0
  }

  /// Drops a queued async waiter. Returns `false` if it had already been
  /// dequeued, meaning the permit now belongs to it.
  fn cancel(&self, waiter: &Arc<Waiter>) -> bool {
    let mut state = self.state.lock();
    match state.waiters.iter().position(|w| Arc::ptr_eq(w, waiter)) {
      Some(pos) => {
        state.waiters.remove(pos);
        true
      }
      None => false,
    }
  }
}

/// Holds the permit of a [`Semaphore`] until dropped.
#[must_use = "the semaphore is released as soon as the guard is dropped"]
pub struct SemaphoreGuard<'a> {
  semaphore: &'a Semaphore,
}

impl fmt::Debug for SemaphoreGuard<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SemaphoreGuard").finish_non_exhaustive()
  }
}

impl Drop for SemaphoreGuard<'_> {
  fn drop(&mut self) {
    self.semaphore.unlock();
  }
}

/// A future that resolves when the permit of a [`Semaphore`] is acquired.
#[must_use = "futures do nothing unless you .await or poll them"]
pub struct LockFuture<'a> {
  semaphore: &'a Semaphore,
  waiter: Option<Arc<Waiter>>,
  acquired: bool,
}

impl fmt::Debug for LockFuture<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LockFuture")
      .field("queued", &self.waiter.is_some())
      .field("acquired", &self.acquired)
      .finish()
  }
}

impl Future for LockFuture<'_> {
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = &mut *self;
    if this.acquired {
      return Poll::Ready(());
    }

    // Re-poll of a queued waiter. Register before checking so a grant that
    // lands in between still wakes us.
    if let Some(waiter) = &this.waiter {
      waiter.register(cx.waker());
      if waiter.is_granted() {
        this.acquired = true;
        return Poll::Ready(());
      }
      return Poll::Pending;
    }

    let mut state = this.semaphore.state.lock();
    if state.permits > 0 {
      state.permits -= 1;
      this.acquired = true;
      return Poll::Ready(());
    }

    let waiter = Waiter::for_task(cx.waker());
    state.waiters.push_back(Arc::clone(&waiter));
    drop(state);
    this.waiter = Some(waiter);
    Poll::Pending
  }
}

impl Drop for LockFuture<'_> {
  fn drop(&mut self) {
    if self.acquired {
      return;
    }
    let Some(waiter) = self.waiter.take() else {
      return;
    };
    if !self.semaphore.cancel(&waiter) {
      // Dequeued by `unlock` before we were polled again: the permit is ours
      // and has to go to the next caller.
      self.semaphore.unlock();
    }
  }
}
