//! SinkHandle - producer side of a sink
//!
//! Cloneable; every clone feeds the same bounded intake queue. A full queue
//! makes the producer wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{ContractError, Event, EventHandler, EventList};
use observability::SinkMetrics;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Handle used by event sources to feed a running sink
#[derive(Clone)]
pub struct SinkHandle {
    name: Arc<str>,
    tx: mpsc::Sender<Event>,
    metrics: Arc<SinkMetrics>,
    first_list_done: Arc<AtomicBool>,
}

impl SinkHandle {
    pub(crate) fn new(name: &str, tx: mpsc::Sender<Event>, metrics: Arc<SinkMetrics>) -> Self {
        Self {
            name: Arc::from(name),
            tx,
            metrics,
            first_list_done: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True until the source delivered its first full listing
    pub fn before_first_list(&self) -> bool {
        !self.first_list_done.load(Ordering::Acquire)
    }

    /// Events waiting in the intake queue
    pub fn queue_len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// True once the sink stopped reading
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn submit(&self, event: Event) -> Result<(), ContractError> {
        let component = event.component().to_string();
        self.tx
            .send(event)
            .await
            .map_err(|_| ContractError::sink_closed(self.name.as_ref()))?;
        self.metrics.record_received(&component);
        Ok(())
    }
}

impl EventHandler for SinkHandle {
    async fn on_add(&self, event: Event) -> Result<(), ContractError> {
        self.submit(event).await
    }

    async fn on_update(&self, old: Option<Event>, new: Event) -> Result<(), ContractError> {
        let old_count = old.as_ref().map_or(0, |event| event.count);
        if new.count != old_count.saturating_add(1) {
            debug!(
                sink = %self.name,
                uid = %new.uid(),
                old_count,
                new_count = new.count,
                "Event count jumped, some occurrences were not observed"
            );
        }
        self.submit(new).await
    }

    async fn on_delete(&self, _event: &Event) -> Result<(), ContractError> {
        Ok(())
    }

    async fn on_list(&self, list: &EventList) -> Result<(), ContractError> {
        if !self.first_list_done.swap(true, Ordering::AcqRel) {
            info!(
                sink = %self.name,
                items = list.items.len(),
                resource_version = ?list.resource_version,
                "Initial listing delivered"
            );
        }
        Ok(())
    }
}
