//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Event Exporter - batches cluster events into a bulk-ingest backend
#[derive(Parser, Debug)]
#[command(
    name = "event-exporter",
    author,
    version,
    about = "Batching event exporter",
    long_about = "Reads a stream of watch notifications, batches the events by size \n\
                  and time, and forwards every batch to a bulk-ingest backend with \n\
                  bounded concurrency."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVENT_EXPORTER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVENT_EXPORTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default level when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the exporter
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "exporter.toml",
        env = "EVENT_EXPORTER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the backend endpoint from configuration
    #[arg(long, env = "EVENT_EXPORTER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Watch stream to read ("-" for stdin)
    #[arg(short, long, default_value = "-", env = "EVENT_EXPORTER_INPUT")]
    pub input: String,

    /// Stop once the input ends instead of waiting for a signal
    #[arg(long)]
    pub exit_on_eof: bool,

    /// Override the flush delay in milliseconds
    #[arg(long, env = "EVENT_EXPORTER_FLUSH_DELAY_MS")]
    pub flush_delay_ms: Option<u64>,

    /// Override the batch size trigger
    #[arg(long, env = "EVENT_EXPORTER_MAX_BUFFER_SIZE")]
    pub max_buffer_size: Option<usize>,

    /// Override the number of concurrent bulk requests
    #[arg(long, env = "EVENT_EXPORTER_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Seconds to wait for in-flight requests after stopping
    #[arg(long, default_value = "5")]
    pub drain_timeout: u64,

    /// Send batches to the log backend instead of the configured one
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9102", env = "EVENT_EXPORTER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "exporter.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "exporter.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["event-exporter", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.input, "-");
        assert_eq!(args.metrics_port, 9102);
        assert_eq!(args.drain_timeout, 5);
        assert!(args.endpoint.is_none());
        assert!(!args.exit_on_eof);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Cli::parse_from(["event-exporter", "info"]).log_level(), "info");
        assert_eq!(Cli::parse_from(["event-exporter", "-vv", "info"]).log_level(), "trace");
        assert_eq!(Cli::parse_from(["event-exporter", "-q", "info"]).log_level(), "warn");
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["event-exporter", "-q", "-v", "info"]).is_err());
    }
}
