//! Dispatcher - decode, validate, deliver
//!
//! One dispatcher per process, bound to exactly one sink. Malformed input
//! from the wire must never crash the loop: decode and validation failures
//! drop the single offending message and are logged with enough context to
//! diagnose.

use std::sync::Arc;

use async_channel::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    DeliveryResult, FailureKind, InboundMessage, RetryPolicy, SinkConfig, SinkKind, TelemetryEvent,
    TelemetrySink,
};

use crate::error::DispatcherError;
use crate::metrics::PipelineMetrics;
use crate::sinks::{ConsoleSink, DatabaseSink, MySqlEventStore, RestSink};

/// The main dispatcher, bound to one sink instance.
pub struct Dispatcher<S: TelemetrySink> {
    sink: S,
    retry: RetryPolicy,
    metrics: Arc<PipelineMetrics>,
}

impl<S: TelemetrySink + 'static> Dispatcher<S> {
    /// Create a dispatcher around a sink
    pub fn new(sink: S, retry: RetryPolicy, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            sink,
            retry,
            metrics,
        }
    }

    /// Handle one raw message end to end.
    ///
    /// Decode and validation failures drop the message and report a failed
    /// result; delivery failures are retried per the configured policy
    /// before the message is dropped.
    #[instrument(name = "dispatcher_handle_message", skip(self, raw), fields(topic = %topic))]
    pub async fn handle_message(&mut self, topic: &str, raw: &[u8]) -> DeliveryResult {
        let fields = match payload::decode(raw) {
            Ok(fields) => fields,
            Err(e) => {
                self.metrics.inc_decode_errors();
                observability::record_decode_error();
                warn!(
                    topic = %topic,
                    payload = %String::from_utf8_lossy(raw),
                    error = %e,
                    "Undecodable payload dropped"
                );
                return DeliveryResult::failed(FailureKind::Decode, e.to_string());
            }
        };

        let event = match payload::validate(&fields, topic) {
            Ok(event) => event,
            Err(e) => {
                self.metrics.inc_validation_errors();
                observability::record_validation_error(e.field());
                warn!(
                    topic = %topic,
                    payload = %String::from_utf8_lossy(raw),
                    field = e.field(),
                    error = %e,
                    "Invalid payload dropped"
                );
                return DeliveryResult::failed(FailureKind::Validation, e.to_string());
            }
        };

        debug!(
            device_id = %event.device_id,
            temperature = event.temperature,
            humidity = event.humidity,
            "Event decoded"
        );

        self.deliver_with_retry(&event).await
    }

    /// Deliver with bounded retry-with-backoff.
    ///
    /// `max_attempts = 1` means a single try and no backoff sleeps.
    async fn deliver_with_retry(&mut self, event: &TelemetryEvent) -> DeliveryResult {
        let mut attempt: u32 = 1;

        loop {
            match self.sink.deliver(event).await {
                Ok(()) => {
                    self.metrics.inc_delivered();
                    observability::record_delivery_success(self.sink.name());
                    return DeliveryResult::ok();
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts.max(1) {
                        self.metrics.inc_failures();
                        observability::record_delivery_failure(self.sink.name());
                        error!(
                            sink = %self.sink.name(),
                            device_id = %event.device_id,
                            attempts = attempt,
                            error = %e,
                            "Delivery failed, event dropped"
                        );
                        return DeliveryResult::failed(FailureKind::from(&e), e.to_string());
                    }

                    let backoff = self.retry.backoff_for(attempt);
                    self.metrics.inc_retries();
                    warn!(
                        sink = %self.sink.name(),
                        device_id = %event.device_id,
                        attempt = attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Delivery failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the dispatcher main loop.
    ///
    /// Consumes messages until the input channel is closed, then closes the
    /// sink. A failed result never stops the loop.
    #[instrument(name = "dispatcher_run", skip(self, input_rx), fields(sink = %self.sink.name()))]
    pub async fn run(mut self, input_rx: Receiver<InboundMessage>) {
        info!(sink = %self.sink.name(), "Dispatcher started");

        let mut message_count: u64 = 0;

        while let Ok(message) = input_rx.recv().await {
            message_count += 1;
            self.metrics.inc_received();
            self.metrics.set_queue_len(input_rx.len());
            observability::record_message_received(&message.topic);
            observability::record_queue_depth(input_rx.len());

            self.handle_message(&message.topic, &message.payload).await;

            if message_count % 100 == 0 {
                debug!(messages = message_count, "Dispatcher progress");
            }
        }

        info!(
            messages = message_count,
            "Dispatcher input closed, shutting down"
        );

        if let Err(e) = self.sink.close().await {
            error!(sink = %self.sink.name(), error = %e, "Close failed on shutdown");
        }

        info!("Dispatcher shutdown complete");
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self, input_rx: Receiver<InboundMessage>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(input_rx).await;
        })
    }
}

/// Build the configured sink and spawn a dispatcher around it.
///
/// Exactly one sink is active per process; the match arms monomorphize the
/// dispatcher per sink type.
#[instrument(
    name = "dispatcher_spawn_from_config",
    skip(config, retry, input_rx, metrics),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn spawn_from_config(
    config: &SinkConfig,
    retry: RetryPolicy,
    input_rx: Receiver<InboundMessage>,
    metrics: Arc<PipelineMetrics>,
) -> Result<JoinHandle<()>, DispatcherError> {
    match config.sink_type {
        SinkKind::Console => {
            let sink = ConsoleSink::new(&config.name);
            Ok(Dispatcher::new(sink, retry, metrics).spawn(input_rx))
        }
        SinkKind::Database => {
            let store = MySqlEventStore::from_params(&config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            let sink = DatabaseSink::new(&config.name, Arc::new(store));
            Ok(Dispatcher::new(sink, retry, metrics).spawn(input_rx))
        }
        SinkKind::Rest => {
            let sink = RestSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            Ok(Dispatcher::new(sink, retry, metrics).spawn(input_rx))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DeliveryError;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        deliver_count: Arc<AtomicU64>,
        failures_before_success: u64,
    }

    impl TelemetrySink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn deliver(&mut self, _event: &TelemetryEvent) -> Result<(), DeliveryError> {
            let n = self.deliver_count.fetch_add(1, Ordering::Relaxed);
            if n < self.failures_before_success {
                return Err(DeliveryError::store_unavailable("mock failure"));
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn mock_dispatcher(
        failures_before_success: u64,
        retry: RetryPolicy,
    ) -> (Dispatcher<MockSink>, Arc<AtomicU64>, Arc<PipelineMetrics>) {
        let deliver_count = Arc::new(AtomicU64::new(0));
        let metrics = Arc::new(PipelineMetrics::new());
        let sink = MockSink {
            name: "mock".to_string(),
            deliver_count: Arc::clone(&deliver_count),
            failures_before_success,
        };
        let dispatcher = Dispatcher::new(sink, retry, Arc::clone(&metrics));
        (dispatcher, deliver_count, metrics)
    }

    const VALID: &[u8] = br#"{"Device":"E89F6DE8F3BC","Temperature":24,"Humidity":77}"#;

    #[tokio::test]
    async fn test_valid_message_delivered_once() {
        let (mut dispatcher, deliver_count, metrics) =
            mock_dispatcher(0, RetryPolicy::default());

        let result = dispatcher.handle_message("/arduino/dht/E89F6DE8F3BC", VALID).await;
        assert!(result.succeeded);
        assert_eq!(deliver_count.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.delivered_count(), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_skips_sink() {
        let (mut dispatcher, deliver_count, metrics) =
            mock_dispatcher(0, RetryPolicy::default());

        let result = dispatcher.handle_message("t", b"{broken").await;
        assert!(!result.succeeded);
        assert_eq!(result.error_kind, Some(FailureKind::Decode));
        assert_eq!(deliver_count.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.decode_error_count(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_sink() {
        let (mut dispatcher, deliver_count, _) = mock_dispatcher(0, RetryPolicy::default());

        let result = dispatcher
            .handle_message("t", br#"{"Temperature":24,"Humidity":77}"#)
            .await;
        assert!(!result.succeeded);
        assert_eq!(result.error_kind, Some(FailureKind::Validation));
        assert!(result.detail.contains("Device"));
        assert_eq!(deliver_count.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let (mut dispatcher, deliver_count, metrics) =
            mock_dispatcher(u64::MAX, RetryPolicy::default());

        let result = dispatcher.handle_message("t", VALID).await;
        assert!(!result.succeeded);
        assert_eq!(result.error_kind, Some(FailureKind::StoreUnavailable));
        assert_eq!(deliver_count.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.failure_count(), 1);
        assert_eq!(metrics.retry_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let retry = RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            multiplier: 1.0,
        };
        let (mut dispatcher, deliver_count, metrics) = mock_dispatcher(2, retry);

        let result = dispatcher.handle_message("t", VALID).await;
        assert!(result.succeeded);
        assert_eq!(deliver_count.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.retry_count(), 2);
        assert_eq!(metrics.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_run_drains_channel_and_closes() {
        let (tx, rx) = async_channel::bounded(10);
        let (dispatcher, deliver_count, metrics) = mock_dispatcher(0, RetryPolicy::default());
        let handle = dispatcher.spawn(rx);

        for _ in 0..5 {
            tx.send(InboundMessage::new("/arduino/dht/a", &VALID[..]))
                .await
                .unwrap();
        }
        // One bad message in the middle must not stop the loop
        tx.send(InboundMessage::new("/arduino/dht/a", &b"garbage"[..]))
            .await
            .unwrap();
        tx.send(InboundMessage::new("/arduino/dht/a", &VALID[..]))
            .await
            .unwrap();

        drop(tx);
        handle.await.unwrap();

        assert_eq!(deliver_count.load(Ordering::Relaxed), 6);
        assert_eq!(metrics.received_count(), 7);
        assert_eq!(metrics.decode_error_count(), 1);
    }
}
