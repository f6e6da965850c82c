//! Utilities for async waiters.

// The semaphore parks async tasks behind an AtomicWaker so a hand-off from
// `unlock` can race with a re-poll without losing the wakeup.
pub(crate) use futures_util::task::AtomicWaker;
