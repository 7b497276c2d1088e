//! Relay metric recording helpers
//!
//! Thin wrappers over the `metrics` facade so metric names stay in one
//! place. All counters are process-wide.

use metrics::{counter, gauge};

/// One raw message arrived from the broker
pub fn record_message_received(topic: &str) {
    counter!("relay_messages_received_total").increment(1);
    counter!("relay_messages_by_topic_total", "topic" => topic.to_string()).increment(1);
}

/// A payload failed to decode and was dropped
pub fn record_decode_error() {
    counter!("relay_decode_errors_total").increment(1);
}

/// A payload failed validation and was dropped
pub fn record_validation_error(field: &str) {
    counter!("relay_validation_errors_total", "field" => field.to_string()).increment(1);
}

/// A sink delivery succeeded
pub fn record_delivery_success(sink: &str) {
    counter!("relay_deliveries_total", "sink" => sink.to_string(), "outcome" => "success")
        .increment(1);
}

/// A sink delivery failed after all retries
pub fn record_delivery_failure(sink: &str) {
    counter!("relay_deliveries_total", "sink" => sink.to_string(), "outcome" => "failure")
        .increment(1);
}

/// A message was dropped by the full dispatch queue
pub fn record_dropped() {
    counter!("relay_messages_dropped_total").increment(1);
}

/// Current dispatch queue depth
pub fn record_queue_depth(depth: usize) {
    gauge!("relay_queue_depth").set(depth as f64);
}

/// A reconnect attempt started
pub fn record_reconnect(attempt: u32) {
    counter!("relay_reconnects_total").increment(1);
    gauge!("relay_reconnect_attempt").set(attempt as f64);
}
