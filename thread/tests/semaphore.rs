mod common;
use common::*;

use fibre_thread::{Context, ManagedThread, Semaphore, StopOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn semaphore_smoke() {
  let sem = Semaphore::new();
  assert!(!sem.is_locked());
  sem.lock();
  assert!(sem.is_locked());
  sem.unlock();
  assert!(!sem.is_locked());
}

#[test]
fn second_lock_resumes_promptly_after_unlock() {
  let sem = Arc::new(Semaphore::new());
  sem.lock();

  let sem_clone = sem.clone();
  let handle = thread::spawn(move || {
    sem_clone.lock();
    let acquired_at = Instant::now();
    sem_clone.unlock();
    acquired_at
  });

  thread::sleep(Duration::from_millis(100));
  assert!(!handle.is_finished(), "second lock should block");

  let released_at = Instant::now();
  sem.unlock();
  let acquired_at = handle.join().unwrap();
  assert!(acquired_at >= released_at);
  assert!(acquired_at - released_at < SHORT_TIMEOUT);
}

#[test]
fn semaphore_serialises_threads() {
  let sem = Arc::new(Semaphore::new());
  let inside = Arc::new(AtomicUsize::new(0));
  let total = Arc::new(AtomicUsize::new(0));
  let mut handles = Vec::new();

  for _ in 0..8 {
    let (sem, inside, total) = (sem.clone(), inside.clone(), total.clone());
    handles.push(thread::spawn(move || {
      for _ in 0..50 {
        let _guard = sem.acquire();
        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0, "two holders at once");
        thread::yield_now();
        inside.fetch_sub(1, Ordering::SeqCst);
        total.fetch_add(1, Ordering::Relaxed);
      }
    }));
  }
  for handle in handles {
    handle.join().unwrap();
  }

  assert_eq!(total.load(Ordering::Relaxed), 8 * 50);
  assert!(!sem.is_locked());
}

#[test]
fn semaphore_signals_readiness_from_worker() {
  init_tracing();
  // The caller holds the semaphore; the worker releases it once it has done
  // its first step, which unblocks the caller.
  let ready = Arc::new(Semaphore::new());
  ready.lock();

  let signal = ready.clone();
  let signalled = Arc::new(AtomicUsize::new(0));
  let signalled_clone = signalled.clone();
  let mut worker = ManagedThread::new(move |ctx: &Context| {
    if signalled_clone.fetch_add(1, Ordering::SeqCst) == 0 {
      signal.unlock();
    }
    ctx.sleep(STEP_SLEEP);
  });
  worker.start("signaller").unwrap();

  ready.lock();
  assert!(signalled.load(Ordering::SeqCst) >= 1);
  ready.unlock();

  assert_eq!(worker.stop(LONG_TIMEOUT), StopOutcome::Graceful);
}

#[tokio::test]
async fn lock_async_interleaves_with_sync_holder() {
  let sem = Arc::new(Semaphore::new());
  sem.lock();

  let sem_clone = sem.clone();
  let releaser = thread::spawn(move || {
    thread::sleep(Duration::from_millis(50));
    sem_clone.unlock();
  });

  tokio::time::timeout(LONG_TIMEOUT, sem.lock_async())
    .await
    .expect("lock_async did not resolve after unlock");
  assert!(sem.is_locked());
  sem.unlock();
  releaser.join().unwrap();
}
