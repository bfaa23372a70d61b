//! ExporterConfig - Config Loader output
//!
//! Describes the bulk backend and the batching parameters of the sink.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default timer window
pub const DEFAULT_FLUSH_DELAY_MS: u64 = 5_000;
/// Default size trigger and intake capacity
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1_000;
/// Default number of concurrent bulk requests
pub const DEFAULT_MAX_CONCURRENCY: usize = 1;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete exporter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExporterConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Bulk backend
    #[serde(default)]
    #[validate(nested)]
    pub backend: BackendConfig,

    /// Batching parameters
    #[serde(default)]
    #[validate(nested)]
    pub sink: SinkSettings,
}

/// Backend implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Elasticsearch `_bulk` over HTTP
    #[default]
    Elasticsearch,
    /// Log every request, send nothing
    Log,
}

/// Bulk backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Backend URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Backend user (accepted, not used for requests)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,

    /// Backend password (accepted, not used for requests)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Index name prefix, suffixed with the send date
    #[serde(default = "default_index_prefix")]
    #[validate(length(min = 1, message = "index prefix cannot be empty"))]
    pub index_prefix: String,

    /// Mapping type written on every document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    /// Startup health check timeout in seconds
    #[serde(default = "default_healthcheck_timeout_secs")]
    #[validate(range(min = 1, message = "health check timeout must be at least 1s"))]
    pub healthcheck_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:9200".to_string()
}

fn default_index_prefix() -> String {
    "events".to_string()
}

fn default_healthcheck_timeout_secs() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            endpoint: default_endpoint(),
            user: String::new(),
            password: String::new(),
            index_prefix: default_index_prefix(),
            doc_type: None,
            healthcheck_timeout_secs: default_healthcheck_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Startup health check timeout
    pub fn healthcheck_timeout(&self) -> Duration {
        Duration::from_secs(self.healthcheck_timeout_secs)
    }
}

/// Batching parameters shared by every sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SinkSettings {
    /// Timer window in milliseconds
    #[serde(default = "default_flush_delay_ms")]
    #[validate(range(min = 1, message = "flush delay must be at least 1ms"))]
    pub flush_delay_ms: u64,

    /// Size trigger and intake queue capacity
    #[serde(default = "default_max_buffer_size")]
    #[validate(range(min = 1, message = "max buffer size must be at least 1"))]
    pub max_buffer_size: usize,

    /// Maximum concurrently running bulk requests
    #[serde(default = "default_max_concurrency")]
    #[validate(range(min = 1, message = "max concurrency must be at least 1"))]
    pub max_concurrency: usize,
}

fn default_flush_delay_ms() -> u64 {
    DEFAULT_FLUSH_DELAY_MS
}

fn default_max_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER_SIZE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            flush_delay_ms: DEFAULT_FLUSH_DELAY_MS,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl SinkSettings {
    /// Create settings from a flush delay and limits
    pub fn new(flush_delay: Duration, max_buffer_size: usize, max_concurrency: usize) -> Self {
        Self {
            flush_delay_ms: flush_delay.as_millis() as u64,
            max_buffer_size,
            max_concurrency,
        }
    }

    /// Timer window
    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }
}
