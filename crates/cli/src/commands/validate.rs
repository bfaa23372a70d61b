//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BackendKind, ExporterConfig};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    backend: String,
    endpoint: String,
    index_prefix: String,
    flush_delay_ms: u64,
    max_buffer_size: usize,
    max_concurrency: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_config(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(ConfigSummary {
                version: format!("{:?}", config.version),
                backend: format!("{:?}", config.backend.kind),
                endpoint: config.backend.endpoint.clone(),
                index_prefix: config.backend.index_prefix.clone(),
                flush_delay_ms: config.sink.flush_delay_ms,
                max_buffer_size: config.sink.max_buffer_size,
                max_concurrency: config.sink.max_concurrency,
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ExporterConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.backend.kind == BackendKind::Log {
        warnings.push("backend.kind is \"log\" - events are logged, not stored".to_string());
    }

    if !config.backend.user.is_empty() {
        warnings.push("backend.user is set but credentials are not sent to the backend".to_string());
    }

    if config.backend.kind == BackendKind::Elasticsearch
        && config.backend.endpoint.starts_with("http://")
        && !is_loopback(&config.backend.endpoint)
    {
        warnings.push(format!(
            "backend.endpoint {} is plain HTTP on a non-local host",
            config.backend.endpoint
        ));
    }

    if config.sink.max_concurrency > config.sink.max_buffer_size {
        warnings.push(
            "sink.max_concurrency exceeds sink.max_buffer_size - extra slots rarely help".to_string(),
        );
    }

    warnings
}

fn is_loopback(endpoint: &str) -> bool {
    let authority = endpoint.trim_start_matches("http://");
    ["localhost", "127.", "[::1]"]
        .iter()
        .any(|prefix| authority.starts_with(prefix))
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Backend: {} ({})", summary.backend, summary.endpoint);
            println!("  Index prefix: {}", summary.index_prefix);
            println!("  Flush delay: {}ms", summary.flush_delay_ms);
            println!("  Max buffer size: {}", summary.max_buffer_size);
            println!("  Max concurrency: {}", summary.max_concurrency);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
