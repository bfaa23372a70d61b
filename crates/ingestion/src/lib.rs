//! # Ingestion
//!
//! Event source side of the exporter.
//!
//! Responsibilities:
//! - Read a Kubernetes-style watch stream (NDJSON, file or stdin)
//! - Track the last seen version of every event by uid
//! - Translate notifications into [`contracts::EventHandler`] callbacks
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::WatchReader;
//!
//! let reader = WatchReader::from_path("events.ndjson").await?;
//! let stats = reader.run(&sink.handle()).await?;
//! ```

mod cache;
mod error;
mod notification;
mod reader;

pub use cache::EventCache;
pub use error::{IngestionError, Result};
pub use notification::WatchNotification;
pub use reader::{SourceStats, WatchReader, MALFORMED_LINE_COUNT};
