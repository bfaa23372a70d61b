//! Bulk ingest contracts - Dispatcher output interface
//!
//! A [`BulkRequest`] carries every document of one batch to a single
//! destination index. Backends answer with a [`BulkResponse`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ContractError;

/// One document inside a bulk request
#[derive(Debug, Clone, PartialEq)]
pub struct BulkDocument {
    /// Mapping type (omitted for typeless backends)
    pub doc_type: Option<String>,
    /// Document id
    pub id: String,
    /// Document body
    pub body: Value,
}

impl BulkDocument {
    /// Create an index document
    pub fn new(doc_type: Option<String>, id: impl Into<String>, body: Value) -> Self {
        Self {
            doc_type,
            id: id.into(),
            body,
        }
    }
}

/// A bulk request targeting one index
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    index: String,
    documents: Vec<BulkDocument>,
}

impl BulkRequest {
    /// Create an empty request for `index`
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            documents: Vec::new(),
        }
    }

    /// Append a document
    pub fn add(&mut self, document: BulkDocument) -> &mut Self {
        self.documents.push(document);
        self
    }

    /// Destination index
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Documents in insertion order
    pub fn documents(&self) -> &[BulkDocument] {
        &self.documents
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the request carries no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Encode as newline-delimited JSON: an `index` action line followed by
    /// the document body, for every document. Ends with a newline.
    pub fn to_ndjson(&self) -> Result<String, ContractError> {
        let mut out = String::new();
        for doc in &self.documents {
            let mut action = serde_json::Map::new();
            action.insert("_index".into(), Value::String(self.index.clone()));
            if let Some(doc_type) = &doc.doc_type {
                action.insert("_type".into(), Value::String(doc_type.clone()));
            }
            action.insert("_id".into(), Value::String(doc.id.clone()));

            let line = serde_json::json!({ "index": action });
            out.push_str(&encode(&doc.id, &line)?);
            out.push('\n');
            out.push_str(&encode(&doc.id, &doc.body)?);
            out.push('\n');
        }
        Ok(out)
    }
}

fn encode(id: &str, value: &Value) -> Result<String, ContractError> {
    serde_json::to_string(value).map_err(|e| ContractError::Encode {
        id: id.to_string(),
        message: e.to_string(),
    })
}

/// Error detail reported for a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkItemError {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

/// Outcome of a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkItemResult {
    #[serde(default, rename = "_index")]
    pub index: String,
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkItemError>,
}

impl BulkItemResult {
    /// Whether the backend rejected this document
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.status >= 300
    }
}

/// A rejected document, as reported to logs
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemFailure {
    pub id: String,
    pub status: u16,
    pub reason: String,
}

/// Backend answer to a bulk request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    /// Server-side time in milliseconds
    #[serde(default)]
    pub took: u64,

    /// True when at least one item failed
    #[serde(default)]
    pub errors: bool,

    /// One entry per document, keyed by action name
    #[serde(default)]
    pub items: Vec<BTreeMap<String, BulkItemResult>>,
}

impl BulkResponse {
    /// A response acknowledging every document of `request`
    pub fn accepted(request: &BulkRequest) -> Self {
        let items = request
            .documents()
            .iter()
            .map(|doc| {
                let mut item = BTreeMap::new();
                item.insert(
                    "index".to_string(),
                    BulkItemResult {
                        index: request.index().to_string(),
                        id: doc.id.clone(),
                        status: 201,
                        error: None,
                    },
                );
                item
            })
            .collect();

        Self {
            took: 0,
            errors: false,
            items,
        }
    }

    /// Per-document failures in response order
    pub fn failed(&self) -> Vec<BulkItemFailure> {
        self.items
            .iter()
            .flat_map(|item| item.values())
            .filter(|result| result.is_failure())
            .map(|result| BulkItemFailure {
                id: result.id.clone(),
                status: result.status,
                reason: result
                    .error
                    .as_ref()
                    .map(|e| e.reason.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Bulk ingest backend
///
/// All backend implementations must implement this trait.
#[trait_variant::make(BulkClient: Send)]
pub trait LocalBulkClient {
    /// Backend name (used for logging)
    fn name(&self) -> &str;

    /// Submit one bulk request
    ///
    /// # Errors
    /// Returns a transport-level error when no bulk response was obtained.
    /// Per-document failures are reported inside the response instead.
    async fn bulk(&self, request: BulkRequest) -> Result<BulkResponse, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ndjson_layout() {
        let mut request = BulkRequest::new("events-2026-10-18");
        request
            .add(BulkDocument::new(
                Some("events".into()),
                "a",
                json!({ "reason": "Pulled" }),
            ))
            .add(BulkDocument::new(None, "b", json!({ "count": 2 })));

        let body = request.to_ndjson().unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(body.ends_with('\n'));

        let action: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_index"], "events-2026-10-18");
        assert_eq!(action["index"]["_type"], "events");
        assert_eq!(action["index"]["_id"], "a");

        let typeless: Value = serde_json::from_str(lines[2]).unwrap();
        assert!(typeless["index"].get("_type").is_none());
        assert_eq!(lines[3], r#"{"count":2}"#);
    }

    #[test]
    fn test_empty_request_encodes_to_empty_body() {
        let request = BulkRequest::new("events");
        assert!(request.is_empty());
        assert_eq!(request.to_ndjson().unwrap(), "");
    }

    #[test]
    fn test_response_failed_items() {
        let json = r#"{
            "took": 7,
            "errors": true,
            "items": [
                { "index": { "_index": "events", "_id": "a", "status": 201 } },
                { "index": { "_index": "events", "_id": "b", "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "failed to parse [count]" } } },
                { "index": { "_index": "events", "_id": "c", "status": 429 } }
            ]
        }"#;

        let response: BulkResponse = serde_json::from_str(json).unwrap();
        let failed = response.failed();

        assert!(response.errors);
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].id, "b");
        assert_eq!(failed[0].reason, "failed to parse [count]");
        assert_eq!(failed[1].status, 429);
        assert_eq!(failed[1].reason, "");
    }

    #[test]
    fn test_accepted_response_has_no_failures() {
        let mut request = BulkRequest::new("events");
        request.add(BulkDocument::new(None, "x", json!({})));

        let response = BulkResponse::accepted(&request);
        assert_eq!(response.items.len(), 1);
        assert!(response.failed().is_empty());
    }
}
