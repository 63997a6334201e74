//! Single-slot delayed task.
//!
//! [`DebounceSlot`] holds at most one pending task. Scheduling a new task
//! replaces the pending one, so of a burst of schedules only the last can
//! ever fire: a trailing-edge debounce.
//!
//! The slot does not spawn anything. The owner awaits [`DebounceSlot::fired`]
//! inside its event loop, typically as one branch of `tokio::select!`:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(text) = input.recv() => slot.schedule(text, Duration::from_millis(420)),
//!         text = slot.fired() => search(text).await,
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    task: T,
}

/// At most one pending delayed task.
#[derive(Debug)]
pub struct DebounceSlot<T> {
    pending: Option<Pending<T>>,
}

impl<T> Default for DebounceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DebounceSlot<T> {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Schedules `task` to fire after `delay`, replacing any pending task.
    ///
    /// Returns the task that was replaced, if any.
    pub fn schedule(&mut self, task: T, delay: Duration) -> Option<T> {
        let replaced = self.pending.take().map(|p| p.task);
        self.pending = Some(Pending {
            deadline: Instant::now() + delay,
            task,
        });
        replaced
    }

    /// Drops the pending task without firing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.task)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits for the pending task's deadline and returns the task.
    ///
    /// Never resolves while the slot is empty. Cancel safe: dropping the
    /// future before it completes leaves the pending task in place.
    pub async fn fired(&mut self) -> T {
        loop {
            let Some(deadline) = self.pending.as_ref().map(|p| p.deadline) else {
                return std::future::pending().await;
            };
            sleep_until(deadline).await;
            if let Some(p) = self.pending.take() {
                return p.task;
            }
        }
    }
}
