//! `run` command implementation.

use std::time::Duration;

use contracts::{BackendKind, ExporterConfig};
use tracing::{info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::error::Result;
use crate::pipeline::{InputSource, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_exporter(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)?;

    if args.dry_run {
        info!(configured = ?config.backend.kind, "Dry run mode - batches go to the log backend");
        config.backend.kind = BackendKind::Log;
    }

    info!(
        backend = ?config.backend.kind,
        endpoint = %config.backend.endpoint,
        index_prefix = %config.backend.index_prefix,
        flush_delay_ms = config.sink.flush_delay_ms,
        max_buffer_size = config.sink.max_buffer_size,
        max_concurrency = config.sink.max_concurrency,
        "Configuration loaded"
    );

    let pipeline_config = PipelineConfig {
        exporter: config,
        input: InputSource::parse(&args.input),
        exit_on_eof: args.exit_on_eof,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
        drain_timeout: Duration::from_secs(args.drain_timeout),
    };

    let stats = Pipeline::new(pipeline_config).run(shutdown_signal()).await?;

    info!(
        received = stats.metrics.received_total,
        sent = stats.metrics.sent_total,
        duration_secs = stats.duration.as_secs_f64(),
        "Exporter finished"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(config: &mut ExporterConfig, args: &RunArgs) {
    if let Some(ref endpoint) = args.endpoint {
        info!(endpoint = %endpoint, "Overriding backend endpoint from CLI");
        config.backend.endpoint = endpoint.clone();
    }
    if let Some(delay) = args.flush_delay_ms {
        config.sink.flush_delay_ms = delay;
    }
    if let Some(size) = args.max_buffer_size {
        config.sink.max_buffer_size = size;
    }
    if let Some(concurrency) = args.max_concurrency {
        config.sink.max_concurrency = concurrency;
    }
}

/// Completes on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
