//! EventSink - batching control loop
//!
//! A single task owns the accumulator and multiplexes three wake sources,
//! checked in priority order: shutdown, flush timer, intake.

use std::future::Future;
use std::sync::Arc;

use contracts::{BulkClient, Event, ExporterConfig, SinkSettings};
use observability::SinkMetrics;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};

use crate::accumulator::Accumulator;
use crate::backends::{connect_backend, Backend};
use crate::dispatcher::{Dispatcher, DocumentOptions};
use crate::error::DispatchError;
use crate::handle::SinkHandle;
use crate::limiter::ConcurrencyLimiter;
use crate::timer;

/// Batching sink bound to one bulk backend
pub struct EventSink<B> {
    name: String,
    accumulator: Accumulator,
    dispatcher: Dispatcher<B>,
    intake: mpsc::Receiver<Event>,
    handle: SinkHandle,
    drained: watch::Sender<bool>,
}

impl<B> EventSink<B>
where
    B: BulkClient + Sync + 'static,
{
    /// Build a sink around an already connected client
    ///
    /// The intake queue holds `max_buffer_size` events.
    pub fn new(
        client: B,
        settings: &SinkSettings,
        options: DocumentOptions,
        metrics: Arc<SinkMetrics>,
    ) -> Self {
        let name = client.name().to_string();
        let capacity = settings.max_buffer_size.max(1);
        let (tx, intake) = mpsc::channel(capacity);

        let limiter = ConcurrencyLimiter::new(settings.max_concurrency);
        let dispatcher = Dispatcher::new(Arc::new(client), limiter, Arc::clone(&metrics), options);
        let handle = SinkHandle::new(&name, tx, metrics);

        debug!(
            sink = %name,
            flush_delay_ms = settings.flush_delay_ms,
            max_buffer_size = capacity,
            max_concurrency = settings.max_concurrency,
            "Sink created"
        );

        Self {
            name,
            accumulator: Accumulator::new(capacity, settings.flush_delay()),
            dispatcher,
            intake,
            handle,
            drained: watch::channel(false).0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Producer handle; clone freely
    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    /// Limiter shared with in-flight sends, for draining after `run`
    pub fn limiter(&self) -> ConcurrencyLimiter {
        self.dispatcher.limiter().clone()
    }

    /// Flips to `true` once every producer handle is gone and the last
    /// pending batch has been handed to a send slot
    ///
    /// The loop itself keeps running until shutdown; in-flight sends are
    /// tracked by [`limiter`](Self::limiter).
    pub fn drained(&self) -> watch::Receiver<bool> {
        self.drained.subscribe()
    }

    /// Run the control loop until `shutdown` completes
    ///
    /// Pending events are discarded on shutdown. Sends already spawned keep
    /// running and still update the sent counter.
    #[instrument(name = "event_sink_run", skip_all, fields(sink = %self.name))]
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self {
            name: _,
            mut accumulator,
            dispatcher,
            mut intake,
            handle,
            drained,
        } = self;
        // Only producer clones keep the intake open
        drop(handle);

        tokio::pin!(shutdown);
        let mut intake_open = true;

        info!(backend = %dispatcher.backend(), "Sink started");

        loop {
            if !intake_open && accumulator.is_empty() && !*drained.borrow() {
                debug!("Intake closed and nothing pending, sink drained");
                drained.send_replace(true);
            }

            let deadline = accumulator.deadline();

            let batch = tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!(pending = accumulator.len(), "Shutdown requested, pending events dropped");
                    break;
                }

                _ = timer::expired(deadline), if deadline.is_some() => accumulator.on_timer_fire(),

                received = intake.recv(), if intake_open => match received {
                    Some(event) => accumulator.enqueue(event),
                    None => {
                        intake_open = false;
                        info!(pending = accumulator.len(), "All producers gone, intake closed");
                        None
                    }
                },
            };

            let Some(batch) = batch else {
                continue;
            };

            debug!(
                seq = batch.seq(),
                trigger = %batch.trigger(),
                size = batch.len(),
                in_flight = dispatcher.in_flight(),
                "Flushing batch"
            );

            let seq = batch.seq();
            let size = batch.len();
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    warn!(seq, size, "Shutdown while waiting for a send slot, batch dropped");
                    break;
                }

                result = dispatcher.flush(batch) => {
                    if let Err(e) = result {
                        error!(seq, size, error = %e, "Dispatch failed, sink stopping");
                        break;
                    }
                }
            }
        }

        info!(in_flight = dispatcher.in_flight(), "Sink stopped");
    }
}

/// Connect the configured backend and build a sink for it
///
/// # Errors
/// Returns [`DispatchError::SinkCreation`] when the backend cannot be reached.
#[instrument(name = "create_sink", skip_all, fields(kind = ?config.backend.kind))]
pub async fn create_sink(
    config: &ExporterConfig,
    metrics: Arc<SinkMetrics>,
) -> Result<EventSink<Backend>, DispatchError> {
    let backend = connect_backend(&config.backend)
        .await
        .map_err(|e| DispatchError::sink_creation(format!("{:?}", config.backend.kind), e))?;

    Ok(EventSink::new(
        backend,
        &config.sink,
        DocumentOptions::from(&config.backend),
        metrics,
    ))
}
