//! Event model - what producers hand to the sink
//!
//! Field names follow the Kubernetes `v1/Event` JSON layout so events read
//! from a watch stream can be forwarded without reshaping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Object metadata carried by every event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name
    #[serde(default)]
    pub name: String,

    /// Namespace (empty for cluster-scoped objects)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Stable unique identifier
    #[serde(default)]
    pub uid: String,

    /// Opaque version assigned by the producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// Reference to the object an event is about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_path: String,
}

/// Component that reported the event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSource {
    /// Reporting component (metrics label)
    #[serde(default)]
    pub component: String,

    /// Host the component runs on
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
}

/// A discrete occurrence forwarded by the sink
///
/// Immutable once enqueued; ownership moves into the sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub involved_object: ObjectReference,

    /// Short machine-readable reason
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(default)]
    pub source: EventSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<DateTime<Utc>>,

    /// Occurrence counter
    #[serde(default)]
    pub count: i32,

    /// Event type ("Normal", "Warning")
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub event_type: String,
}

impl Event {
    /// Create an event with the given uid, source component and count
    pub fn new(uid: impl Into<String>, component: impl Into<String>, count: i32) -> Self {
        Self {
            metadata: ObjectMeta {
                uid: uid.into(),
                ..Default::default()
            },
            source: EventSource {
                component: component.into(),
                ..Default::default()
            },
            count,
            ..Default::default()
        }
    }

    /// Stable identifier (document id on the backend)
    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }

    /// Reporting component (metrics label)
    pub fn component(&self) -> &str {
        &self.source.component
    }
}

/// Result of a full listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<Event>,

    /// Version the listing was taken at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}
