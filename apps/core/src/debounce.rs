//! Trailing-edge debouncing on the tokio timer.
//!
//! At most one action is pending at a time. Scheduling again before the
//! delay elapses aborts the pending action and restarts the delay, so a burst
//! of calls produces a single invocation carrying the last call's action.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` once `delay` has passed without another `schedule` call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, action: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }

        // Deadline is fixed now, not when the task first gets polled.
        let deadline = Instant::now() + delay;
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            action();
        }));
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
