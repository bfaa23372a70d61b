//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the exporter.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data flow
//! - An event source calls [`EventHandler`] notifications
//! - The sink batches [`Event`]s and hands them to a [`BulkClient`]
//! - The backend answers with a [`BulkResponse`] carrying per-document failures

mod bulk;
mod config;
mod error;
mod event;
mod handler;

pub use bulk::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use handler::{EventHandler, LocalEventHandler};
