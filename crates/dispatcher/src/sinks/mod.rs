//! Sink implementations
//!
//! Contains ConsoleSink, DatabaseSink, and RestSink.

mod console;
mod database;
mod rest;

pub use self::console::ConsoleSink;
pub use self::database::{DatabaseSink, MySqlEventStore};
pub use self::rest::RestSink;

/// Render a reading for downstream consumers that expect integral values
/// without a decimal point (`24`, not `24.0`).
pub(crate) fn fmt_reading(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
