//! # Dispatcher
//!
//! Batching sink core.
//!
//! Responsibilities:
//! - Accept events from producers through a bounded intake queue
//! - Accumulate them into batches closed by size or by a flush timer
//! - Forward each batch to a bulk backend, at most `max_concurrency` at a time
//!
//! ```text
//! producer ──► SinkHandle ──► intake ──► Accumulator ──► Dispatcher ──► BulkClient
//!                                            ▲                │
//!                                       FlushTimer    ConcurrencyLimiter
//! ```

pub mod accumulator;
pub mod backends;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod limiter;
pub mod sink;
pub mod timer;

pub use accumulator::{Accumulator, Batch, FlushTrigger};
pub use backends::{connect_backend, Backend, ElasticsearchClient, LogClient, MemoryClient};
pub use contracts::{BulkClient, Event, EventHandler};
pub use dispatcher::{Dispatcher, DocumentOptions};
pub use error::DispatchError;
pub use handle::SinkHandle;
pub use limiter::{ConcurrencyLimiter, LimiterToken};
pub use sink::{create_sink, EventSink};
pub use timer::FlushTimer;
