//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Configuration contracts (file format to sink settings)
//! - Watch stream -> SinkHandle -> EventSink -> bulk backend flows

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BackendKind, ConfigVersion, ExporterConfig};

    const EXPORTER_TOML: &str = r#"
version = "V1"

[backend]
kind = "elasticsearch"
endpoint = "https://es.example.com:9243"
index_prefix = "kube-events"
doc_type = "events"

[sink]
flush_delay_ms = 2000
max_buffer_size = 500
max_concurrency = 4
"#;

    #[test]
    fn test_full_config_loads() {
        let config = ConfigLoader::load_from_str(EXPORTER_TOML, ConfigFormat::Toml).unwrap();

        assert_eq!(config.version, ConfigVersion::V1);
        assert_eq!(config.backend.kind, BackendKind::Elasticsearch);
        assert_eq!(config.backend.doc_type.as_deref(), Some("events"));
        assert_eq!(config.sink.flush_delay().as_millis(), 2000);
        assert_eq!(config.sink.max_concurrency, 4);
    }

    #[test]
    fn test_toml_and_json_agree() {
        let from_toml = ConfigLoader::load_from_str(EXPORTER_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&from_toml).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();

        assert_eq!(from_json.sink, from_toml.sink);
        assert_eq!(from_json.backend.endpoint, from_toml.backend.endpoint);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigLoader::validate(&ExporterConfig::default()).is_ok());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Event, EventHandler, ExporterConfig};
    use dispatcher::{DocumentOptions, EventSink, MemoryClient};
    use ingestion::WatchReader;
    use observability::SinkMetrics;
    use tokio::sync::oneshot;

    fn config(flush_delay_ms: u64, max_buffer_size: usize, max_concurrency: usize) -> ExporterConfig {
        let toml = format!(
            r#"
[backend]
kind = "log"
index_prefix = "kube-events"
doc_type = "events"

[sink]
flush_delay_ms = {flush_delay_ms}
max_buffer_size = {max_buffer_size}
max_concurrency = {max_concurrency}
"#
        );
        ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap()
    }

    fn sink_for(
        client: &MemoryClient,
        config: &ExporterConfig,
    ) -> (EventSink<MemoryClient>, Arc<SinkMetrics>) {
        let metrics = Arc::new(SinkMetrics::new());
        let sink = EventSink::new(
            client.clone(),
            &config.sink,
            DocumentOptions::from(&config.backend),
            Arc::clone(&metrics),
        );
        (sink, metrics)
    }

    const WATCH_STREAM: &str = r#"{"type":"LIST","resourceVersion":"10","items":[{"metadata":{"uid":"l1"},"source":{"component":"kubelet"},"count":1},{"metadata":{"uid":"l2"},"source":{"component":"scheduler"},"count":1}]}
{"type":"ADDED","object":{"metadata":{"uid":"a1"},"source":{"component":"kubelet"},"count":1}}
{"type":"MODIFIED","object":{"metadata":{"uid":"l1"},"source":{"component":"kubelet"},"count":2}}
{"type":"DELETED","object":{"metadata":{"uid":"l2"}}}
{"type":"ADDED","object":{"metadata":{"uid":"a2"},"source":{"component":"kubelet"},"count":1}}
{"type":"ADDED","object":{"metadata":{"uid":"a3"},"source":{"component":"controller"},"count":1}}
"#;

    /// Watch stream -> reader -> sink -> memory backend
    ///
    /// Six events are enqueued (deletes are ignored): one size-triggered
    /// batch of four, then a timer-triggered batch of two.
    #[tokio::test(start_paused = true)]
    async fn test_e2e_watch_stream_batches() {
        let config = config(50, 4, 1);
        let client = MemoryClient::new();
        let (sink, metrics) = sink_for(&client, &config);

        let handle = sink.handle();
        let limiter = sink.limiter();
        let (stop, stopped) = oneshot::channel::<()>();
        let sink_task = tokio::spawn(sink.run(async move {
            let _ = stopped.await;
        }));

        let stats = WatchReader::new(WATCH_STREAM.as_bytes(), "fixture")
            .run(&handle)
            .await
            .unwrap();
        assert_eq!(stats.deleted, 1);
        assert!(!handle.before_first_list());

        tokio::time::sleep(Duration::from_millis(100)).await;
        limiter.wait_idle().await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].len(), 4);
        assert_eq!(requests[1].len(), 2);
        assert!(requests[0].index().starts_with("kube-events-"));
        assert_eq!(requests[0].documents()[0].doc_type.as_deref(), Some("events"));
        assert_eq!(client.document_ids(), ["l1", "l2", "a1", "l1", "a2", "a3"]);

        assert_eq!(metrics.received_total(), 6);
        assert_eq!(metrics.received_for("kubelet"), 4);
        assert_eq!(metrics.sent_total(), 6);

        stop.send(()).unwrap();
        sink_task.await.unwrap();
    }

    /// Many producers, slow backend: in-flight sends never exceed the limit
    #[tokio::test(start_paused = true)]
    async fn test_e2e_concurrency_bound_under_load() {
        let config = config(1_000, 10, 3);
        let client = MemoryClient::with_latency(Duration::from_millis(30));
        let (sink, metrics) = sink_for(&client, &config);

        let limiter = sink.limiter();
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let handle = sink.handle();
                tokio::spawn(async move {
                    for i in 0..50 {
                        handle
                            .on_add(Event::new(format!("p{p}-{i}"), "kubelet", 1))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();

        let (stop, stopped) = oneshot::channel::<()>();
        let sink_task = tokio::spawn(sink.run(async move {
            let _ = stopped.await;
        }));

        for producer in producers {
            producer.await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        limiter.wait_idle().await.unwrap();

        assert_eq!(client.requests().len(), 20);
        assert!(client.requests().iter().all(|r| r.len() == 10));
        assert_eq!(client.peak_concurrency(), 3);
        assert_eq!(metrics.sent_total(), 200);

        stop.send(()).unwrap();
        sink_task.await.unwrap();
    }

    /// Rejected documents are logged; the batch still counts as sent
    #[tokio::test(start_paused = true)]
    async fn test_e2e_partial_rejection() {
        let config = config(20, 100, 1);
        let client = MemoryClient::rejecting(["bad"]);
        let (sink, metrics) = sink_for(&client, &config);

        let handle = sink.handle();
        let limiter = sink.limiter();
        let (stop, stopped) = oneshot::channel::<()>();
        let sink_task = tokio::spawn(sink.run(async move {
            let _ = stopped.await;
        }));

        for uid in ["ok-1", "bad", "ok-2"] {
            handle.on_add(Event::new(uid, "kubelet", 1)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        limiter.wait_idle().await.unwrap();

        assert_eq!(client.rejected(), 1);
        assert_eq!(metrics.sent_total(), 3);

        stop.send(()).unwrap();
        sink_task.await.unwrap();
    }

    /// After shutdown producers get a closed-sink error and the reader stops
    #[tokio::test(start_paused = true)]
    async fn test_e2e_reader_stops_when_sink_gone() {
        let config = config(50, 4, 1);
        let client = MemoryClient::new();
        let (sink, _metrics) = sink_for(&client, &config);

        let handle = sink.handle();
        sink.run(async {}).await;

        let result = WatchReader::new(WATCH_STREAM.as_bytes(), "fixture")
            .run(&handle)
            .await;
        assert!(matches!(
            result,
            Err(ingestion::IngestionError::HandlerClosed { .. })
        ));
        assert!(client.requests().is_empty());
    }
}
