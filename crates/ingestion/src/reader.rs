//! WatchReader - replays a watch stream into an event handler
//!
//! Keeps an [`EventCache`] so updates carry the previously seen version.
//! Malformed lines are logged and counted; only I/O failures and a closed
//! handler stop the reader.

use std::path::Path;

use contracts::{ContractError, EventHandler, EventList};
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::{debug, info, instrument, warn};

use crate::cache::EventCache;
use crate::error::{IngestionError, Result};
use crate::notification::WatchNotification;

/// Counter for lines that could not be parsed
pub const MALFORMED_LINE_COUNT: &str = "event_exporter_watch_malformed_line_count";

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub lines: u64,
    pub lists: u64,
    pub added: u64,
    pub modified: u64,
    pub deleted: u64,
    pub bookmarks: u64,
    pub watch_errors: u64,
    pub malformed: u64,
    pub handler_errors: u64,
}

/// Line-oriented watch stream reader
pub struct WatchReader<R> {
    source: String,
    reader: R,
    cache: EventCache,
}

impl WatchReader<BufReader<File>> {
    /// Open a file containing a recorded watch stream
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .map_err(|e| IngestionError::io(path.display().to_string(), e))?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl WatchReader<BufReader<Stdin>> {
    /// Read the watch stream from standard input
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl<R> WatchReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reader,
            cache: EventCache::new(),
        }
    }

    /// Name used in logs and errors
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Events currently known to the cache
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Feed every notification to `handler` until end of input
    ///
    /// # Errors
    /// Fails on read errors or when the handler reports it is closed.
    #[instrument(name = "watch_reader_run", skip_all, fields(source = %self.source))]
    pub async fn run<H>(mut self, handler: &H) -> Result<SourceStats>
    where
        H: EventHandler + Sync,
    {
        let mut stats = SourceStats::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|e| IngestionError::io(self.source.clone(), e))?;
            if read == 0 {
                break;
            }
            stats.lines += 1;

            let notification = match WatchNotification::parse_line(&line) {
                Ok(Some(notification)) => notification,
                Ok(None) => continue,
                Err(e) => {
                    stats.malformed += 1;
                    metrics::counter!(MALFORMED_LINE_COUNT).increment(1);
                    warn!(line = stats.lines, error = %e, "Malformed watch line skipped");
                    continue;
                }
            };

            let kind = notification.kind();
            let outcome = self.apply(notification, handler, &mut stats).await;
            match outcome {
                Ok(()) => {}
                Err(ContractError::SinkClosed { sink_name }) => {
                    return Err(IngestionError::HandlerClosed {
                        message: format!("sink '{sink_name}' stopped accepting events"),
                    });
                }
                Err(e) => {
                    stats.handler_errors += 1;
                    warn!(line = stats.lines, kind, error = %e, "Handler rejected notification");
                }
            }
        }

        info!(
            lines = stats.lines,
            added = stats.added,
            modified = stats.modified,
            deleted = stats.deleted,
            malformed = stats.malformed,
            cached = self.cache.len(),
            "Watch stream ended"
        );
        Ok(stats)
    }

    async fn apply<H>(
        &mut self,
        notification: WatchNotification,
        handler: &H,
        stats: &mut SourceStats,
    ) -> std::result::Result<(), ContractError>
    where
        H: EventHandler + Sync,
    {
        match notification {
            WatchNotification::List(list) => {
                stats.lists += 1;
                self.relist(list, handler).await
            }
            WatchNotification::Added { object } => {
                stats.added += 1;
                self.cache.upsert(object.clone());
                handler.on_add(object).await
            }
            WatchNotification::Modified { object } => {
                stats.modified += 1;
                let old = self.cache.upsert(object.clone());
                handler.on_update(old, object).await
            }
            WatchNotification::Deleted { object } => {
                stats.deleted += 1;
                let known = self.cache.remove(object.uid()).unwrap_or(object);
                handler.on_delete(&known).await
            }
            WatchNotification::Bookmark { .. } => {
                stats.bookmarks += 1;
                Ok(())
            }
            WatchNotification::Error { object } => {
                stats.watch_errors += 1;
                warn!(status = %object, "Watch error notification");
                Ok(())
            }
        }
    }

    async fn relist<H>(&mut self, list: EventList, handler: &H) -> std::result::Result<(), ContractError>
    where
        H: EventHandler + Sync,
    {
        debug!(items = list.items.len(), "Listing received");
        self.cache.replace(&list.items);

        for event in list.items.iter().cloned() {
            handler.on_add(event).await?;
        }
        handler.on_list(&list).await
    }
}
