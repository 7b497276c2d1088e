//! TelemetrySink trait - Dispatcher output interface
//!
//! Defines the abstract interface for sinks.

use crate::{DeliveryError, TelemetryEvent};

/// Event delivery trait
///
/// All sink implementations must implement this trait. Exactly one sink is
/// active per process; the interface permits a composing fan-out sink if a
/// future requirement needs it.
#[trait_variant::make(TelemetrySink: Send)]
pub trait LocalTelemetrySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one event.
    ///
    /// Must not mutate the event and must not block beyond the
    /// collaborator-imposed per-call timeout.
    ///
    /// # Errors
    /// Returns the delivery failure; the caller decides retry/drop.
    async fn deliver(&mut self, event: &TelemetryEvent) -> Result<(), DeliveryError>;

    /// Close sink, releasing any pooled connection
    async fn close(&mut self) -> Result<(), DeliveryError>;
}
