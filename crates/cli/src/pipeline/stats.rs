//! Pipeline statistics and metrics.

use std::time::Duration;

use dispatcher::PipelineSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Counter snapshot at shutdown
    pub counters: PipelineSnapshot,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Name of the active sink
    pub sink_name: String,
}

impl PipelineStats {
    /// Messages received per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.counters.received_count as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of received messages that reached the sink, as percentage
    pub fn delivery_rate(&self) -> f64 {
        if self.counters.received_count > 0 {
            (self.counters.delivered_count as f64 / self.counters.received_count as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let c = &self.counters;

        println!("\n=== Pipeline Statistics ===\n");
        println!("Overview:");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Sink: {}", self.sink_name);
        println!("  Messages received: {}", c.received_count);
        println!("  Throughput: {:.2} msg/s", self.throughput());

        println!("\nDelivery:");
        println!(
            "  Delivered: {} ({:.2}%)",
            c.delivered_count,
            self.delivery_rate()
        );
        println!("  Failed: {}", c.failure_count);
        println!("  Retries: {}", c.retry_count);

        println!("\nRejections:");
        println!("  Decode errors: {}", c.decode_error_count);
        println!("  Validation errors: {}", c.validation_error_count);
        println!("  Dropped (queue full): {}", c.dropped_count);

        println!();
    }
}
