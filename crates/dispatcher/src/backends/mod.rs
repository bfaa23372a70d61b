//! Bulk backend implementations
//!
//! Contains ElasticsearchClient, LogClient, and MemoryClient.

mod elasticsearch;
mod log;
mod memory;

pub use self::elasticsearch::ElasticsearchClient;
pub use self::log::LogClient;
pub use self::memory::MemoryClient;

use contracts::{BackendConfig, BackendKind, BulkClient, BulkRequest, BulkResponse, ContractError};
use tracing::instrument;

/// Backend selected by configuration
pub enum Backend {
    Elasticsearch(ElasticsearchClient),
    Log(LogClient),
}

impl BulkClient for Backend {
    fn name(&self) -> &str {
        match self {
            Self::Elasticsearch(client) => client.name(),
            Self::Log(client) => client.name(),
        }
    }

    async fn bulk(&self, request: BulkRequest) -> Result<BulkResponse, ContractError> {
        match self {
            Self::Elasticsearch(client) => client.bulk(request).await,
            Self::Log(client) => client.bulk(request).await,
        }
    }
}

/// Create the configured backend
///
/// # Errors
/// Returns [`ContractError::BackendConnection`] when the backend cannot be reached.
#[instrument(name = "connect_backend", skip(config), fields(kind = ?config.kind))]
pub async fn connect_backend(config: &BackendConfig) -> Result<Backend, ContractError> {
    match config.kind {
        BackendKind::Elasticsearch => Ok(Backend::Elasticsearch(
            ElasticsearchClient::connect(config).await?,
        )),
        BackendKind::Log => Ok(Backend::Log(LogClient::new("log"))),
    }
}
