//! ElasticsearchClient - `_bulk` API over HTTP
//!
//! The connection is checked once at construction; a failed check is a
//! construction error. Bulk calls carry no request timeout.

use contracts::{BackendConfig, BulkClient, BulkRequest, BulkResponse, ContractError};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument, warn};

const NDJSON: &str = "application/x-ndjson";

/// Longest response excerpt kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Elasticsearch bulk client
pub struct ElasticsearchClient {
    name: String,
    endpoint: String,
    http: reqwest::Client,
}

impl ElasticsearchClient {
    /// Build the HTTP client and run the startup health check
    ///
    /// # Errors
    /// Returns [`ContractError::BackendConnection`] if the endpoint does not
    /// answer with a success status within the health check timeout.
    #[instrument(name = "elasticsearch_connect", skip(config), fields(endpoint = %config.endpoint))]
    pub async fn connect(config: &BackendConfig) -> Result<Self, ContractError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.healthcheck_timeout())
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| ContractError::backend_connection("elasticsearch", e.to_string()))?;

        if !config.user.is_empty() {
            debug!("Backend credentials configured but not applied");
        }

        let client = Self {
            name: "elasticsearch".to_string(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            http,
        };

        client.health_check(config).await?;
        info!(endpoint = %client.endpoint, "Elasticsearch client initialized");
        Ok(client)
    }

    /// Base URL without trailing slash
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bulk_url(&self) -> String {
        format!("{}/_bulk", self.endpoint)
    }

    async fn health_check(&self, config: &BackendConfig) -> Result<(), ContractError> {
        let response = self
            .http
            .get(&self.endpoint)
            .timeout(config.healthcheck_timeout())
            .send()
            .await
            .map_err(|e| {
                ContractError::backend_connection(
                    &self.name,
                    format!("health check against {} failed: {e}", self.endpoint),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::backend_connection(
                &self.name,
                format!("health check against {} returned HTTP {status}", self.endpoint),
            ));
        }

        debug!(status = %status, "Elasticsearch health check passed");
        Ok(())
    }
}

impl BulkClient for ElasticsearchClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "elasticsearch_bulk",
        skip(self, request),
        fields(index = %request.index(), documents = request.len())
    )]
    async fn bulk(&self, request: BulkRequest) -> Result<BulkResponse, ContractError> {
        if request.is_empty() {
            warn!("Empty bulk request not sent");
            return Ok(BulkResponse::default());
        }

        let body = request.to_ndjson()?;
        let response = self
            .http
            .post(self.bulk_url())
            .header(CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await
            .map_err(|e| ContractError::bulk_transport(&self.name, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ContractError::bulk_transport(&self.name, e.to_string()))?;

        if !status.is_success() {
            return Err(ContractError::bulk_transport(
                &self.name,
                format!("HTTP {status}: {}", excerpt(&text)),
            ));
        }

        serde_json::from_str(&text).map_err(|e| {
            ContractError::bulk_transport(
                &self.name,
                format!("unreadable bulk response ({e}): {}", excerpt(&text)),
            )
        })
    }
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
