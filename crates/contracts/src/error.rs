//! Layered error definitions
//!
//! Categorized by source: config / backend / sink / source

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Backend Errors =====
    /// Backend connection setup failed (fatal to sink construction)
    #[error("backend '{backend}' connection error: {message}")]
    BackendConnection { backend: String, message: String },

    /// Bulk request failed at the transport level
    #[error("backend '{backend}' bulk request failed: {message}")]
    BulkTransport { backend: String, message: String },

    /// Document could not be encoded for the backend
    #[error("failed to encode document '{id}': {message}")]
    Encode { id: String, message: String },

    // ===== Sink Errors =====
    /// The sink stopped accepting events
    #[error("sink '{sink_name}' is closed")]
    SinkClosed { sink_name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create backend connection error
    pub fn backend_connection(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendConnection {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create bulk transport error
    pub fn bulk_transport(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BulkTransport {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create sink closed error
    pub fn sink_closed(sink_name: impl Into<String>) -> Self {
        Self::SinkClosed {
            sink_name: sink_name.into(),
        }
    }
}
