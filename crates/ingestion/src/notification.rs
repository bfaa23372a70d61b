//! Watch stream wire format
//!
//! One JSON object per line:
//!
//! ```text
//! {"type":"LIST","items":[...],"resourceVersion":"41"}
//! {"type":"ADDED","object":{...}}
//! {"type":"MODIFIED","object":{...}}
//! {"type":"DELETED","object":{...}}
//! {"type":"BOOKMARK","object":{...}}
//! {"type":"ERROR","object":{...}}
//! ```

use contracts::{Event, EventList};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of the watch stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum WatchNotification {
    /// Full listing, delivered at start and on relist
    List(EventList),
    Added { object: Event },
    Modified { object: Event },
    Deleted { object: Event },
    /// Progress marker; carries no event
    Bookmark { object: Value },
    /// Server-side watch error (usually a `Status` object)
    Error { object: Value },
}

impl WatchNotification {
    /// Parse one raw line; blank lines yield `None`
    ///
    /// Bytes that are not valid UTF-8 surface as a JSON error.
    pub fn parse_line(line: impl AsRef<[u8]>) -> Result<Option<Self>, serde_json::Error> {
        let line = line.as_ref().trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(line).map(Some)
    }

    /// Wire name of the notification type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::List(_) => "LIST",
            Self::Added { .. } => "ADDED",
            Self::Modified { .. } => "MODIFIED",
            Self::Deleted { .. } => "DELETED",
            Self::Bookmark { .. } => "BOOKMARK",
            Self::Error { .. } => "ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_added() {
        let line = r#"{"type":"ADDED","object":{"metadata":{"uid":"u1"},"source":{"component":"kubelet"},"count":2}}"#;
        let parsed = WatchNotification::parse_line(line).unwrap().unwrap();

        match parsed {
            WatchNotification::Added { object } => {
                assert_eq!(object.uid(), "u1");
                assert_eq!(object.component(), "kubelet");
                assert_eq!(object.count, 2);
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }

    #[test]
    fn test_parse_list() {
        let line = r#"{"type":"LIST","resourceVersion":"41","items":[{"metadata":{"uid":"a"}},{"metadata":{"uid":"b"}}]}"#;
        let parsed = WatchNotification::parse_line(line).unwrap().unwrap();

        assert_eq!(parsed.kind(), "LIST");
        let WatchNotification::List(list) = parsed else {
            panic!("expected LIST");
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.resource_version.as_deref(), Some("41"));
    }

    #[test]
    fn test_parse_error_status() {
        let line = r#"{"type":"ERROR","object":{"kind":"Status","code":410,"reason":"Expired"}}"#;
        let parsed = WatchNotification::parse_line(line).unwrap().unwrap();
        assert_eq!(parsed.kind(), "ERROR");
    }

    #[test]
    fn test_blank_line_skipped() {
        assert!(WatchNotification::parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(WatchNotification::parse_line(r#"{"type":"RENAMED","object":{}}"#).is_err());
        assert!(WatchNotification::parse_line("not json").is_err());
    }
}
