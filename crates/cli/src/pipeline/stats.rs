//! Pipeline statistics.

use std::time::Duration;

use ingestion::SourceStats;
use observability::MetricsSnapshot;

/// Statistics from an exporter run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Wall time from sink start to drain completion
    pub duration: Duration,

    /// Reader counters; `None` if the reader was interrupted
    pub source: Option<SourceStats>,

    /// Sink counters at exit
    pub metrics: MetricsSnapshot,

    /// Requests still running when the drain timeout expired
    pub in_flight_at_exit: usize,
}

impl PipelineStats {
    /// Acknowledged events per second
    pub fn sent_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.sent_total as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Exporter Statistics ===\n");
        println!("Overview");
        println!("  Duration:        {:.2}s", self.duration.as_secs_f64());
        println!("  Received:        {}", self.metrics.received_total);
        println!("  Sent:            {}", self.metrics.sent_total);
        println!("  Sent/s:          {:.2}", self.sent_per_sec());
        if self.in_flight_at_exit > 0 {
            println!("  Abandoned sends: {}", self.in_flight_at_exit);
        }

        if !self.metrics.received_by_component.is_empty() {
            println!("\nReceived by component");
            for (component, count) in &self.metrics.received_by_component {
                println!("  {component}: {count}");
            }
        }

        if let Some(source) = &self.source {
            println!("\nWatch stream");
            println!("  Lines:     {}", source.lines);
            println!("  Listings:  {}", source.lists);
            println!("  Added:     {}", source.added);
            println!("  Modified:  {}", source.modified);
            println!("  Deleted:   {}", source.deleted);
            if source.malformed > 0 {
                println!("  Malformed: {}", source.malformed);
            }
        }

        println!();
    }
}
