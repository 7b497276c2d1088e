//! # Dispatcher
//!
//! Message dispatch module.
//!
//! Responsibilities:
//! - Consume raw `InboundMessage`s from the subscription queue
//! - Decode and validate each payload
//! - Deliver the resulting event to the single configured sink
//! - Never let one bad message take down the receive loop

pub mod dispatcher;
pub mod error;
pub mod hostinfo;
pub mod metrics;
pub mod sinks;

pub use contracts::{DeliveryResult, TelemetrySink};
pub use dispatcher::{spawn_from_config, Dispatcher};
pub use error::DispatcherError;
pub use metrics::{PipelineMetrics, PipelineSnapshot};
pub use sinks::{ConsoleSink, DatabaseSink, MySqlEventStore, RestSink};
