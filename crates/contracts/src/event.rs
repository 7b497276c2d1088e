//! TelemetryEvent - the canonical decoded record
//!
//! Built only by the validator after a successful decode; immutable afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decoded and validated telemetry reading.
///
/// Created per inbound message, handed to exactly one sink, then discarded.
/// There is no mutating API on purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Device identifier (source MAC or similar), never empty
    pub device_id: String,

    /// Temperature in degrees; any finite value, no range clamping
    pub temperature: f64,

    /// Relative humidity in percent; any finite value
    pub humidity: f64,

    /// Stamped at receipt time, not parsed from the payload
    pub received_at: DateTime<Utc>,

    /// Topic the message arrived on
    pub source_topic: String,
}

impl TelemetryEvent {
    /// Construct an event stamped with the current time.
    pub fn new(
        device_id: impl Into<String>,
        temperature: f64,
        humidity: f64,
        source_topic: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            temperature,
            humidity,
            received_at: Utc::now(),
            source_topic: source_topic.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_carries_topic() {
        let event = TelemetryEvent::new("E89F6DE8F3BC", 24.0, 77.0, "/arduino/dht/E89F6DE8F3BC");
        assert_eq!(event.device_id, "E89F6DE8F3BC");
        assert_eq!(event.source_topic, "/arduino/dht/E89F6DE8F3BC");
    }

    #[test]
    fn test_event_serializes() {
        let event = TelemetryEvent::new("dev", 21.5, 60.0, "/arduino/dht/dev");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("21.5"));
    }
}
