//! Pipeline orchestrator - wires the watch reader to the sink.
//!
//! Lifecycle:
//! 1. Start the Prometheus endpoint (optional)
//! 2. Connect the backend and start the sink loop
//! 3. Feed the sink from the input until it ends or a signal arrives
//! 4. Stop the sink, then wait a bounded time for in-flight requests

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::ExporterConfig;
use dispatcher::{create_sink, SinkHandle};
use ingestion::{SourceStats, WatchReader};
use observability::SinkMetrics;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, instrument, warn};

use super::PipelineStats;
use crate::error::{CliError, Result};

/// Where watch notifications come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` means stdin, anything else is a path
    pub fn parse(input: &str) -> Self {
        if input == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(input))
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated exporter configuration
    pub exporter: ExporterConfig,

    pub input: InputSource,

    /// Stop when the input ends
    pub exit_on_eof: bool,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Upper bound on waiting for in-flight requests at exit
    pub drain_timeout: Duration,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the input ends (with `exit_on_eof`) or `shutdown` completes
    #[instrument(name = "pipeline_run", skip_all, fields(input = ?self.config.input))]
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let PipelineConfig {
            exporter,
            input,
            exit_on_eof,
            metrics_port,
            drain_timeout,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let metrics = Arc::new(SinkMetrics::new());
        let sink = create_sink(&exporter, Arc::clone(&metrics))
            .await
            .map_err(|e| CliError::backend_connection(&exporter.backend.endpoint, e.to_string()))?;

        let reader_handle = sink.handle();
        let limiter = sink.limiter();
        let drained = sink.drained();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let sink_task = tokio::spawn(sink.run(async move {
            let _ = stop_rx.await;
        }));

        // The reader owns the only producer handle, so the intake closes at EOF
        let mut reader_task =
            tokio::spawn(async move { read_input(input, &reader_handle).await });

        tokio::pin!(shutdown);

        let outcome: Result<Option<SourceStats>> = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping reader");
                reader_task.abort();
                Ok(None)
            }
            joined = &mut reader_task => {
                match joined.map_err(anyhow::Error::from) {
                    Ok(Ok(stats)) => {
                        if exit_on_eof {
                            info!("Input ended, flushing remaining events");
                            linger(drained, shutdown.as_mut()).await;
                        } else {
                            info!("Input ended, waiting for shutdown signal");
                            shutdown.as_mut().await;
                        }
                        Ok(Some(stats))
                    }
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(e.into()),
                }
            }
        };

        // Sink: stop the loop, pending events are discarded
        let _ = stop_tx.send(());
        sink_task
            .await
            .map_err(|e| CliError::shutdown(format!("sink task failed: {e}")))?;

        let in_flight_at_exit = drain(&limiter, drain_timeout).await;

        let source = outcome?;
        Ok(PipelineStats {
            duration: start_time.elapsed(),
            source,
            metrics: metrics.snapshot(),
            in_flight_at_exit,
        })
    }
}

async fn read_input(input: InputSource, handle: &SinkHandle) -> ingestion::Result<SourceStats> {
    match input {
        InputSource::Stdin => WatchReader::stdin().run(handle).await,
        InputSource::File(path) => WatchReader::from_path(&path).await?.run(handle).await,
    }
}

/// Wait until the sink handed its last pending batch to a send slot
async fn linger<F>(mut drained: watch::Receiver<bool>, shutdown: Pin<&mut F>)
where
    F: Future<Output = ()>,
{
    let settle = async move { drained.wait_for(|done| *done).await.is_ok() };

    tokio::select! {
        settled = settle => {
            if settled {
                debug!("Final batch handed off");
            } else {
                warn!("Sink stopped before the final batch was handed off");
            }
        }
        _ = shutdown => info!("Shutdown signal received while flushing"),
    }
}

/// Wait for in-flight requests; returns how many were abandoned
async fn drain(limiter: &dispatcher::ConcurrencyLimiter, timeout: Duration) -> usize {
    match tokio::time::timeout(timeout, limiter.wait_idle()).await {
        Ok(Ok(())) => {
            debug!("All bulk requests completed");
            0
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Could not wait for in-flight requests");
            limiter.in_flight()
        }
        Err(_) => {
            let in_flight = limiter.in_flight();
            warn!(
                in_flight,
                timeout_secs = timeout.as_secs_f64(),
                "Drain timeout expired, abandoning in-flight requests"
            );
            in_flight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BackendConfig, BackendKind, SinkSettings};
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn config(input: InputSource, exit_on_eof: bool) -> PipelineConfig {
        PipelineConfig {
            exporter: ExporterConfig {
                backend: BackendConfig {
                    kind: BackendKind::Log,
                    ..Default::default()
                },
                sink: SinkSettings::new(Duration::from_millis(20), 2, 1),
                ..Default::default()
            },
            input,
            exit_on_eof,
            metrics_port: None,
            drain_timeout: Duration::from_secs(1),
        }
    }

    fn watch_file(events: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..events {
            writeln!(
                file,
                r#"{{"type":"ADDED","object":{{"metadata":{{"uid":"e{i}"}},"source":{{"component":"kubelet"}},"count":1}}}}"#
            )
            .unwrap();
        }
        writeln!(file, "garbage").unwrap();
        file
    }

    /// Elasticsearch stand-in: health check answers at once, `_bulk` after `latency`
    async fn slow_backend(latency: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(answer(socket, latency));
            }
        });

        format!("http://{addr}")
    }

    async fn answer(mut socket: TcpStream, latency: Duration) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        if head.starts_with("post /_bulk") {
            tokio::time::sleep(latency).await;
        }
        let body = r#"{"took":1,"errors":false,"items":[]}"#;
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(reply.as_bytes()).await.ok();
        socket.shutdown().await.ok();
    }

    #[test]
    fn test_input_source_parse() {
        assert_eq!(InputSource::parse("-"), InputSource::Stdin);
        assert_eq!(
            InputSource::parse("events.ndjson"),
            InputSource::File(PathBuf::from("events.ndjson"))
        );
    }

    #[tokio::test]
    async fn test_exit_on_eof_flushes_partial_batch() {
        let file = watch_file(5);
        let pipeline = Pipeline::new(config(InputSource::File(file.path().to_path_buf()), true));

        let stats = pipeline.run(std::future::pending()).await.unwrap();

        assert_eq!(stats.metrics.received_total, 5);
        assert_eq!(stats.metrics.sent_total, 5);
        assert_eq!(stats.in_flight_at_exit, 0);
        let source = stats.source.unwrap();
        assert_eq!(source.added, 5);
        assert_eq!(source.malformed, 1);
    }

    #[tokio::test]
    async fn test_exit_on_eof_sends_tail_behind_slow_backend() {
        let endpoint = slow_backend(Duration::from_millis(300)).await;
        let file = watch_file(3);
        let mut config = config(InputSource::File(file.path().to_path_buf()), true);
        config.exporter.backend = BackendConfig {
            endpoint,
            healthcheck_timeout_secs: 2,
            ..Default::default()
        };
        config.drain_timeout = Duration::from_secs(5);

        let stats = Pipeline::new(config).run(std::future::pending()).await.unwrap();

        assert_eq!(stats.metrics.received_total, 3);
        assert_eq!(stats.metrics.sent_total, 3);
        assert_eq!(stats.in_flight_at_exit, 0);
    }

    #[tokio::test]
    async fn test_waits_for_signal_after_eof() {
        let file = watch_file(3);
        let pipeline = Pipeline::new(config(InputSource::File(file.path().to_path_buf()), false));

        let stats = pipeline
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        assert!(stats.duration >= Duration::from_millis(200));
        assert_eq!(stats.metrics.sent_total, 3);
    }

    #[tokio::test]
    async fn test_missing_input_file_fails_after_clean_stop() {
        let pipeline = Pipeline::new(config(
            InputSource::File(PathBuf::from("/nonexistent/watch.ndjson")),
            true,
        ));

        let err = pipeline.run(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, CliError::Source(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let mut config = config(InputSource::Stdin, true);
        config.exporter.backend = BackendConfig {
            endpoint: "http://127.0.0.1:1".into(),
            healthcheck_timeout_secs: 1,
            ..Default::default()
        };

        let err = Pipeline::new(config).run(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, CliError::BackendConnection { .. }));
    }
}
