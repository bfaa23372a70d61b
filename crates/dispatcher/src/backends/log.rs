//! LogClient - logs bulk request summaries via tracing

use contracts::{BulkClient, BulkRequest, BulkResponse, ContractError};
use tracing::{debug, info, instrument};

/// Backend that logs every request and acknowledges all documents
pub struct LogClient {
    name: String,
}

impl LogClient {
    /// Create a new LogClient with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BulkClient for LogClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_client_bulk",
        skip(self, request),
        fields(backend = %self.name, index = %request.index())
    )]
    async fn bulk(&self, request: BulkRequest) -> Result<BulkResponse, ContractError> {
        info!(
            backend = %self.name,
            index = %request.index(),
            documents = request.len(),
            "Bulk request received"
        );
        for doc in request.documents() {
            debug!(id = %doc.id, body = %doc.body, "Document");
        }
        Ok(BulkResponse::accepted(&request))
    }
}
