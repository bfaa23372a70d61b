//! FlushTimer - lazily armed flush deadline
//!
//! No timer exists while the pending batch is empty. The first event after
//! an empty period arms it; firing or detaching a batch clears it.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Resettable one-shot deadline owned by the run loop
#[derive(Debug)]
pub struct FlushTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl FlushTimer {
    /// Create an unarmed timer with the given window
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Fire `delay` from now, restarting the window if already armed
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Drop the deadline
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Completes at `deadline`; never completes for `None`
pub async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
