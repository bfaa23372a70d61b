//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {source}")]
    SinkCreation {
        name: String,
        #[source]
        source: contracts::ContractError,
    },

    /// The concurrency limiter no longer hands out slots
    #[error("concurrency limiter closed")]
    LimiterClosed,

    /// Contract-level error
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatchError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, source: contracts::ContractError) -> Self {
        Self::SinkCreation {
            name: name.into(),
            source,
        }
    }
}
