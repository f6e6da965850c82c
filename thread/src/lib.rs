//! Managed worker threads with cooperative lifecycle control.
//!
//! `fibre_thread` wraps one OS thread in a small state machine: start it,
//! let it loop over a task body, pause and resume it, and stop it with a
//! bounded timeout. A binary [`Semaphore`] with blocking and async waiters is
//! provided alongside for the task body's own cross-thread signalling.

pub mod builder;
pub mod error;
pub mod managed;
pub mod semaphore;
pub mod state;
pub mod task;

// Internal utilities - not part of public API
mod async_util;
mod sync_util;

// Public re-exports for convenience
pub use builder::ThreadBuilder;
pub use error::StartError;
pub use managed::{Controller, ManagedThread, MAX_NAME_LEN};
pub use semaphore::{LockFuture, Semaphore, SemaphoreGuard};
pub use state::{StopOutcome, ThreadState};
pub use task::{Context, Task};
