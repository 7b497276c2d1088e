//! Pipeline orchestrator - coordinates all components.
//!
//! Wires broker subscription -> bounded queue -> dispatcher, drives the
//! run to completion, and flushes the dispatcher on shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{InboundMessage, RelayBlueprint};
use dispatcher::PipelineMetrics;
use subscription::{MqttTransport, Subscription};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::PipelineStats;

/// How long to wait for the dispatcher to drain the queue at shutdown
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The relay blueprint configuration
    pub blueprint: RelayBlueprint,

    /// Pipeline timeout (None = run until shutdown)
    pub timeout: Option<Duration>,

    /// Queue capacity override (None = use blueprint)
    pub buffer_size: Option<usize>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until shutdown, timeout, or a fatal broker error
    pub async fn run(self, shutdown: CancellationToken) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let capacity = self
            .config
            .buffer_size
            .unwrap_or(blueprint.queue.capacity);

        info!(
            host = %blueprint.broker.host,
            port = blueprint.broker.port,
            topic = %blueprint.broker.topic,
            sink = %blueprint.sink.name,
            capacity,
            "Wiring pipeline"
        );

        // Queue between subscription and dispatcher
        let (tx, rx) = async_channel::bounded::<InboundMessage>(capacity);

        // Dispatcher consumes the queue and owns the sink
        let metrics = Arc::new(PipelineMetrics::new());
        let dispatcher_handle =
            dispatcher::spawn_from_config(&blueprint.sink, blueprint.retry, rx, metrics.clone())
                .context("Failed to create dispatcher")?;

        info!(sink = %blueprint.sink.name, "Dispatcher started");

        // Subscription feeds the queue; it owns the only sender, so the
        // queue closes when the subscription ends and the dispatcher
        // drains the remainder.
        let transport = MqttTransport::new(blueprint.broker.clone());
        let subscription = Subscription::new(
            Box::new(transport),
            blueprint.reconnect,
            blueprint.queue.drop_policy,
            tx,
            shutdown.clone(),
        );
        let subscription_handle = subscription::spawn(subscription);

        info!("Pipeline running");

        let subscription_result = match self.config.timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, subscription_handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                        shutdown.cancel();
                        Ok(Ok(()))
                    }
                }
            }
            None => subscription_handle.await,
        };

        // Flush whatever is still queued
        info!("Shutting down pipeline...");
        if tokio::time::timeout(DRAIN_GRACE, dispatcher_handle)
            .await
            .is_err()
        {
            warn!(
                grace_secs = DRAIN_GRACE.as_secs(),
                "Dispatcher did not drain in time"
            );
        }

        let stats = PipelineStats {
            counters: metrics.snapshot(),
            duration: start_time.elapsed(),
            sink_name: blueprint.sink.name.clone(),
        };

        match subscription_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(e).context("Broker subscription failed");
            }
            Err(e) => {
                return Err(e).context("Subscription task panicked");
            }
        }

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            received = stats.counters.received_count,
            delivered = stats.counters.delivered_count,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
