#![allow(dead_code)]

use std::time::Duration;

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(500);
pub const LONG_TIMEOUT: Duration = Duration::from_secs(3);
pub const STEP_SLEEP: Duration = Duration::from_millis(5);

/// Installs a test-writer subscriber so `tracing` output shows up for failing
/// tests. Safe to call from every test.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fibre_thread=debug")),
    )
    .with_test_writer()
    .try_init();
}
