//! Sink 计数器
//!
//! 进程级计数器，启动时创建一次，以 `Arc` 注入到 sink 中。
//! 每次递增同时写入原子计数（进程内读取）和 `metrics` facade（Prometheus 抓取）。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use metrics::counter;

/// Events received, labeled by `component`
pub const RECEIVED_ENTRY_COUNT: &str = "event_exporter_received_entry_count";

/// Events acknowledged by the backend
pub const SUCCESSFULLY_SENT_ENTRY_COUNT: &str = "event_exporter_successfully_sent_entry_count";

/// Received / sent counters shared by the sink and its dispatches
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Received, all components
    received_total: AtomicU64,
    /// Received, per component
    received_by_component: RwLock<HashMap<String, AtomicU64>>,
    /// Successfully sent
    sent_total: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one received event from `component`
    pub fn record_received(&self, component: &str) {
        self.received_total.fetch_add(1, Ordering::Relaxed);
        counter!(RECEIVED_ENTRY_COUNT, "component" => component.to_string()).increment(1);

        // Fast path: label already known
        if let Ok(map) = self.received_by_component.read() {
            if let Some(count) = map.get(component) {
                count.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        let mut map = match self.received_by_component.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(component.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Count `n` events acknowledged by the backend
    pub fn record_sent(&self, n: usize) {
        self.sent_total.fetch_add(n as u64, Ordering::Relaxed);
        counter!(SUCCESSFULLY_SENT_ENTRY_COUNT).increment(n as u64);
    }

    /// Total received across components
    pub fn received_total(&self) -> u64 {
        self.received_total.load(Ordering::Relaxed)
    }

    /// Received from one component
    pub fn received_for(&self, component: &str) -> u64 {
        let map = match self.received_by_component.read() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.get(component)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Total successfully sent
    pub fn sent_total(&self) -> u64 {
        self.sent_total.load(Ordering::Relaxed)
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let map = match self.received_by_component.read() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut received_by_component: Vec<(String, u64)> = map
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();
        received_by_component.sort();

        MetricsSnapshot {
            received_total: self.received_total(),
            received_by_component,
            sent_total: self.sent_total(),
        }
    }
}

/// Snapshot of sink counters (for reporting)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub received_total: u64,
    /// Sorted by component name
    pub received_by_component: Vec<(String, u64)>,
    pub sent_total: u64,
}
