//! Dispatcher - hands detached batches to the bulk backend
//!
//! `flush` runs on the control loop: it takes a limiter slot (waiting if the
//! limiter is saturated) and spawns the send. The send owns the slot and
//! gives it back when it finishes, whatever the outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{BulkClient, BulkDocument, BulkRequest, Event};
use observability::SinkMetrics;
use tracing::{debug, error, instrument, trace, warn};

use crate::accumulator::Batch;
use crate::error::DispatchError;
use crate::limiter::ConcurrencyLimiter;

/// How events are turned into backend documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Index prefix; the send date is appended
    pub index_prefix: String,
    /// Mapping type written on every document
    pub doc_type: Option<String>,
}

impl DocumentOptions {
    pub fn new(index_prefix: impl Into<String>, doc_type: Option<String>) -> Self {
        Self {
            index_prefix: index_prefix.into(),
            doc_type,
        }
    }

    /// Destination index for a send happening at `now`
    pub fn index_name(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}", self.index_prefix, now.format("%Y-%m-%d"))
    }
}

impl From<&contracts::BackendConfig> for DocumentOptions {
    fn from(config: &contracts::BackendConfig) -> Self {
        Self::new(config.index_prefix.clone(), config.doc_type.clone())
    }
}

/// Launches bulk sends under the concurrency limit
pub struct Dispatcher<B> {
    client: Arc<B>,
    limiter: ConcurrencyLimiter,
    metrics: Arc<SinkMetrics>,
    options: Arc<DocumentOptions>,
}

impl<B> Dispatcher<B>
where
    B: BulkClient + Sync + 'static,
{
    pub fn new(
        client: Arc<B>,
        limiter: ConcurrencyLimiter,
        metrics: Arc<SinkMetrics>,
        options: DocumentOptions,
    ) -> Self {
        Self {
            client,
            limiter,
            metrics,
            options: Arc::new(options),
        }
    }

    /// Backend name
    pub fn backend(&self) -> &str {
        self.client.name()
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Sends currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.limiter.in_flight()
    }

    /// Submit a batch for sending
    ///
    /// Waits for a limiter slot, then returns as soon as the send is spawned.
    /// Empty batches are absorbed.
    pub async fn flush(&self, batch: Batch) -> Result<(), DispatchError> {
        if batch.is_empty() {
            trace!(seq = batch.seq(), "Empty batch absorbed");
            return Ok(());
        }

        let token = self.limiter.acquire().await?;

        let client = Arc::clone(&self.client);
        let metrics = Arc::clone(&self.metrics);
        let options = Arc::clone(&self.options);

        tokio::spawn(async move {
            send_batch(client.as_ref(), batch, &options, &metrics).await;
            token.release();
        });

        Ok(())
    }
}

/// Build one bulk request for the whole batch
///
/// Events that cannot be encoded are logged and left out.
pub fn build_request(events: &[Event], options: &DocumentOptions, now: DateTime<Utc>) -> BulkRequest {
    let mut request = BulkRequest::new(options.index_name(now));
    for event in events {
        match serde_json::to_value(event) {
            Ok(body) => {
                request.add(BulkDocument::new(
                    options.doc_type.clone(),
                    event.uid(),
                    body,
                ));
            }
            Err(e) => {
                warn!(uid = %event.uid(), error = %e, "Event could not be encoded, skipped");
            }
        }
    }
    request
}

#[instrument(
    name = "dispatcher_send_batch",
    skip_all,
    fields(backend = %client.name(), seq = batch.seq(), trigger = %batch.trigger(), size = batch.len())
)]
async fn send_batch<B: BulkClient>(
    client: &B,
    batch: Batch,
    options: &DocumentOptions,
    metrics: &SinkMetrics,
) {
    let request = build_request(batch.events(), options, Utc::now());
    let index = request.index().to_string();
    let documents = request.len();

    debug!(index = %index, documents, "Sending batch");

    match client.bulk(request).await {
        Ok(response) => {
            metrics.record_sent(documents);
            debug!(
                index = %index,
                documents,
                took_ms = response.took,
                "Batch sent"
            );

            for failure in response.failed() {
                error!(
                    index = %index,
                    id = %failure.id,
                    status = failure.status,
                    reason = %failure.reason,
                    "Document rejected by backend"
                );
            }
        }
        Err(e) => {
            error!(index = %index, documents, error = %e, "Bulk request failed, batch dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::FlushTrigger;
    use crate::backends::MemoryClient;
    use chrono::TimeZone;
    use std::time::Duration;

    fn batch(seq: u64, n: usize) -> Batch {
        let events = (0..n)
            .map(|i| Event::new(format!("b{seq}-{i}"), "kubelet", 1))
            .collect();
        Batch::new(seq, FlushTrigger::Size, events)
    }

    fn dispatcher(
        client: &MemoryClient,
        capacity: usize,
    ) -> (Dispatcher<MemoryClient>, Arc<SinkMetrics>) {
        let metrics = Arc::new(SinkMetrics::new());
        let dispatcher = Dispatcher::new(
            Arc::new(client.clone()),
            ConcurrencyLimiter::new(capacity),
            Arc::clone(&metrics),
            DocumentOptions::new("events", Some("events".into())),
        );
        (dispatcher, metrics)
    }

    #[test]
    fn test_index_name_uses_send_date() {
        let options = DocumentOptions::new("kube-events", None);
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 23, 59, 59).unwrap();
        assert_eq!(options.index_name(now), "kube-events-2026-10-18");
    }

    #[test]
    fn test_build_request_uses_uid_and_type() {
        let options = DocumentOptions::new("events", Some("events".into()));
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let request = build_request(batch(0, 2).events(), &options, now);

        assert_eq!(request.index(), "events-2026-01-02");
        assert_eq!(request.len(), 2);
        assert_eq!(request.documents()[1].id, "b0-1");
        assert_eq!(request.documents()[0].doc_type.as_deref(), Some("events"));
        assert_eq!(request.documents()[0].body["source"]["component"], "kubelet");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_sends_and_counts() {
        let client = MemoryClient::new();
        let (dispatcher, metrics) = dispatcher(&client, 1);

        dispatcher.flush(batch(0, 3)).await.unwrap();
        dispatcher.limiter().wait_idle().await.unwrap();

        assert_eq!(client.requests().len(), 1);
        assert_eq!(metrics.sent_total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch_absorbed() {
        let client = MemoryClient::new();
        let (dispatcher, _) = dispatcher(&client, 1);

        dispatcher.flush(batch(0, 0)).await.unwrap();
        dispatcher.limiter().wait_idle().await.unwrap();

        assert!(client.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_releases_slot() {
        let client = MemoryClient::failing("connection reset by peer");
        let (dispatcher, metrics) = dispatcher(&client, 1);

        dispatcher.flush(batch(0, 2)).await.unwrap();
        // Would hang forever if the slot leaked
        tokio::time::timeout(Duration::from_secs(1), dispatcher.flush(batch(1, 2)))
            .await
            .expect("slot released after failure")
            .unwrap();
        dispatcher.limiter().wait_idle().await.unwrap();

        assert_eq!(client.started(), 2);
        assert_eq!(metrics.sent_total(), 0);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_still_counts_batch() {
        let client = MemoryClient::rejecting(["b0-1"]);
        let (dispatcher, metrics) = dispatcher(&client, 1);

        dispatcher.flush(batch(0, 3)).await.unwrap();
        dispatcher.limiter().wait_idle().await.unwrap();

        assert_eq!(metrics.sent_total(), 3);
        assert_eq!(client.rejected(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_send_waits_for_slot() {
        // MaxConcurrency=1: second send starts only after the first releases
        let client = MemoryClient::gated();
        let (dispatcher, metrics) = dispatcher(&client, 1);

        dispatcher.flush(batch(0, 1)).await.unwrap();
        client.wait_started(1).await;

        let second = dispatcher.flush(batch(1, 1));
        tokio::pin!(second);
        assert!(
            tokio::time::timeout(Duration::from_millis(100), &mut second)
                .await
                .is_err(),
            "second flush must wait for a slot"
        );
        assert_eq!(client.started(), 1);

        client.open(1);
        second.await.unwrap();
        client.wait_started(2).await;
        client.open(1);
        dispatcher.limiter().wait_idle().await.unwrap();

        assert_eq!(client.peak_concurrency(), 1);
        assert_eq!(metrics.sent_total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_never_exceeds_limit() {
        let client = MemoryClient::with_latency(Duration::from_millis(25));
        let (dispatcher, metrics) = dispatcher(&client, 3);

        for seq in 0..20 {
            dispatcher.flush(batch(seq, 2)).await.unwrap();
            assert!(dispatcher.in_flight() <= 3);
        }
        dispatcher.limiter().wait_idle().await.unwrap();

        assert_eq!(client.requests().len(), 20);
        assert_eq!(client.peak_concurrency(), 3);
        assert_eq!(metrics.sent_total(), 40);
    }
}
