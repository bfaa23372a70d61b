//! MemoryClient - in-process backend that records requests
//!
//! Used by tests to observe what the sink sends. Supports latency,
//! whole-request failure, per-document rejection, and a gate that holds
//! every request until the caller opens it.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use contracts::{BulkClient, BulkItemError, BulkItemResult, BulkRequest, BulkResponse, ContractError};
use tokio::sync::{watch, Semaphore};

#[derive(Debug, Default)]
enum Behavior {
    #[default]
    Accept,
    Fail(String),
    Reject(HashSet<String>),
}

#[derive(Debug)]
struct Inner {
    behavior: Behavior,
    latency: Option<Duration>,
    gate: Option<Semaphore>,
    requests: Mutex<Vec<BulkRequest>>,
    started: watch::Sender<usize>,
    active: AtomicUsize,
    peak: AtomicUsize,
    rejected: AtomicUsize,
}

/// Recording backend for tests
#[derive(Debug, Clone)]
pub struct MemoryClient {
    inner: Arc<Inner>,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    /// Accept every document immediately
    pub fn new() -> Self {
        Self::build(Behavior::Accept, None, false)
    }

    /// Fail every request at the transport level
    pub fn failing(message: impl Into<String>) -> Self {
        Self::build(Behavior::Fail(message.into()), None, false)
    }

    /// Reject the documents with the given ids, accept the rest
    pub fn rejecting<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(Into::into).collect();
        Self::build(Behavior::Reject(ids), None, false)
    }

    /// Accept every document after `latency`
    pub fn with_latency(latency: Duration) -> Self {
        Self::build(Behavior::Accept, Some(latency), false)
    }

    /// Hold every request until [`open`](Self::open) lets it through
    pub fn gated() -> Self {
        Self::build(Behavior::Accept, None, true)
    }

    fn build(behavior: Behavior, latency: Option<Duration>, gated: bool) -> Self {
        let (started, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                behavior,
                latency,
                gate: gated.then(|| Semaphore::new(0)),
                requests: Mutex::new(Vec::new()),
                started,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                rejected: AtomicUsize::new(0),
            }),
        }
    }

    /// Let `n` gated requests complete
    pub fn open(&self, n: usize) {
        if let Some(gate) = &self.inner.gate {
            gate.add_permits(n);
        }
    }

    /// Requests that reached the backend, in arrival order
    pub fn requests(&self) -> Vec<BulkRequest> {
        self.lock().clone()
    }

    /// Document ids received across all requests
    pub fn document_ids(&self) -> Vec<String> {
        self.lock()
            .iter()
            .flat_map(|r| r.documents().iter().map(|d| d.id.clone()))
            .collect()
    }

    /// Number of requests that started
    pub fn started(&self) -> usize {
        *self.inner.started.borrow()
    }

    /// Wait until at least `n` requests started
    pub async fn wait_started(&self, n: usize) {
        let mut rx = self.inner.started.subscribe();
        // The sender lives in `inner`, so the channel cannot close here
        let _ = rx.wait_for(|started| *started >= n).await;
    }

    /// Highest number of requests observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Documents rejected so far
    pub fn rejected(&self) -> usize {
        self.inner.rejected.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BulkRequest>> {
        match self.inner.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn respond(&self, request: &BulkRequest) -> Result<BulkResponse, ContractError> {
        match &self.inner.behavior {
            Behavior::Accept => Ok(BulkResponse::accepted(request)),
            Behavior::Fail(message) => Err(ContractError::bulk_transport("memory", message.clone())),
            Behavior::Reject(ids) => {
                let mut response = BulkResponse::accepted(request);
                for item in response.items.iter_mut().flat_map(BTreeMap::values_mut) {
                    if ids.contains(&item.id) {
                        *item = BulkItemResult {
                            status: 400,
                            error: Some(BulkItemError {
                                kind: "mapper_parsing_exception".into(),
                                reason: format!("document '{}' rejected", item.id),
                            }),
                            ..item.clone()
                        };
                        response.errors = true;
                        self.inner.rejected.fetch_add(1, Ordering::SeqCst);
                    }
                }
                Ok(response)
            }
        }
    }
}

impl BulkClient for MemoryClient {
    fn name(&self) -> &str {
        "memory"
    }

    async fn bulk(&self, request: BulkRequest) -> Result<BulkResponse, ContractError> {
        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(active, Ordering::SeqCst);
        self.lock().push(request.clone());
        self.inner.started.send_modify(|started| *started += 1);

        if let Some(gate) = &self.inner.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(latency) = self.inner.latency {
            tokio::time::sleep(latency).await;
        }

        let response = self.respond(&request);
        self.inner.active.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
