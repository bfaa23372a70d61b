//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::ExporterConfig;
use serde::Serialize;
use tracing::info;

use super::{load_config, mask};
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    backend: BackendInfo,
    sink: SinkInfo,
}

#[derive(Serialize)]
struct BackendInfo {
    kind: String,
    endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    user: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    password: String,
    index_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_type: Option<String>,
    healthcheck_timeout_secs: u64,
}

#[derive(Serialize)]
struct SinkInfo {
    flush_delay_ms: u64,
    max_buffer_size: usize,
    max_concurrency: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &ExporterConfig) -> ConfigInfo {
    let backend = &config.backend;
    ConfigInfo {
        version: format!("{:?}", config.version),
        backend: BackendInfo {
            kind: format!("{:?}", backend.kind),
            endpoint: backend.endpoint.clone(),
            user: backend.user.clone(),
            password: mask(&backend.password).to_string(),
            index_prefix: backend.index_prefix.clone(),
            doc_type: backend.doc_type.clone(),
            healthcheck_timeout_secs: backend.healthcheck_timeout_secs,
        },
        sink: SinkInfo {
            flush_delay_ms: config.sink.flush_delay_ms,
            max_buffer_size: config.sink.max_buffer_size,
            max_concurrency: config.sink.max_concurrency,
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Exporter Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nBackend:");
    println!("  Kind: {}", info.backend.kind);
    println!("  Endpoint: {}", info.backend.endpoint);
    if !info.backend.user.is_empty() {
        println!("  User: {}", info.backend.user);
        println!("  Password: {}", info.backend.password);
    }
    println!("  Index: {}-YYYY-MM-DD", info.backend.index_prefix);
    if let Some(ref doc_type) = info.backend.doc_type {
        println!("  Document type: {}", doc_type);
    }
    println!(
        "  Health check timeout: {}s",
        info.backend.healthcheck_timeout_secs
    );

    println!("\nSink:");
    println!("  Flush delay: {}ms", info.sink.flush_delay_ms);
    println!("  Max buffer size: {}", info.sink.max_buffer_size);
    println!("  Max concurrency: {}", info.sink.max_concurrency);

    println!();
}
