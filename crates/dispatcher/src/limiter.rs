//! ConcurrencyLimiter - counting admission gate for dispatches
//!
//! A slot is held by a [`LimiterToken`] and returned when the token drops,
//! so every exit path of a dispatch releases it.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::DispatchError;

/// Bounds the number of simultaneously running dispatches
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of admission capacity
#[derive(Debug)]
#[must_use = "dropping the token releases the slot immediately"]
pub struct LimiterToken {
    _permit: OwnedSemaphorePermit,
}

impl LimiterToken {
    /// Return the slot to the limiter
    pub fn release(self) {}
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, u32::MAX as usize);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a slot is free and take it
    pub async fn acquire(&self) -> Result<LimiterToken, DispatchError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::LimiterClosed)?;
        Ok(LimiterToken { _permit: permit })
    }

    #[cfg(test)]
    fn try_acquire(&self) -> Option<LimiterToken> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| LimiterToken { _permit: permit })
    }

    /// Total slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Wait until every slot has been returned
    pub async fn wait_idle(&self) -> Result<(), DispatchError> {
        let _all = self
            .semaphore
            .acquire_many(self.capacity as u32)
            .await
            .map_err(|_| DispatchError::LimiterClosed)?;
        Ok(())
    }
}
