//! # Payload
//!
//! Wire payload handling: decode raw bytes into untyped fields, then
//! validate them into a `TelemetryEvent`.
//!
//! Both stages are pure and safe to call repeatedly and in parallel.

mod codec;
mod validate;

pub use codec::{decode, RawFields};
pub use validate::validate;
