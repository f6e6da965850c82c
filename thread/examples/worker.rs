// examples/worker.rs
use fibre_thread::{Context, ManagedThread, Semaphore, Task, ThreadState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A task that bumps a shared counter under the semaphore on every step.
struct Ticker {
  counter: Arc<AtomicUsize>,
  guard: Arc<Semaphore>,
}

impl Task for Ticker {
  fn run_once(&self, ctx: &Context) {
    {
      let _held = self.guard.acquire();
      let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
      if n % 10 == 0 {
        println!("[{}] tick {} (iteration {})", ctx.name(), n, ctx.iteration());
      }
    }
    ctx.sleep(Duration::from_millis(20));
  }
}

fn main() {
  let counter = Arc::new(AtomicUsize::new(0));
  let guard = Arc::new(Semaphore::new());

  let mut worker = ManagedThread::new(Ticker {
    counter: counter.clone(),
    guard: guard.clone(),
  });

  println!("--- Start ---");
  if let Err(e) = worker.start("ticker") {
    eprintln!("failed to start: {}", e);
    return;
  }
  worker.wait_until_ready(Duration::from_secs(1));
  println!("status: {}", worker.status());
  thread::sleep(Duration::from_millis(300));

  println!("--- Pause ---");
  worker.pause();
  let paused_at = counter.load(Ordering::Relaxed);
  thread::sleep(Duration::from_millis(200));
  println!(
    "status: {}, ticks while paused: {}",
    worker.status(),
    counter.load(Ordering::Relaxed).saturating_sub(paused_at)
  );

  println!("--- Hold the semaphore from main ---");
  worker.resume();
  worker.wait_until_ready(Duration::from_secs(1));
  {
    let _held = guard.acquire();
    let before = counter.load(Ordering::Relaxed);
    thread::sleep(Duration::from_millis(100));
    println!(
      "ticks while main held the semaphore: {}",
      counter.load(Ordering::Relaxed) - before
    );
  }
  thread::sleep(Duration::from_millis(200));

  println!("--- Stop ---");
  let outcome = worker.stop(Duration::from_secs(2));
  println!("stop: {}, status: {}", outcome, worker.status());
  assert_eq!(worker.status(), ThreadState::Stopped);
  println!("total ticks: {}", counter.load(Ordering::Relaxed));
}
