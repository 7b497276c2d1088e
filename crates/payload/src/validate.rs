//! EventValidator - untyped fields to TelemetryEvent
//!
//! Checks presence and type of the three required fields and coerces the
//! numeric ones to f64. No range checking on temperature/humidity values.

use contracts::{TelemetryEvent, ValidationError};
use serde_json::Value;

use crate::codec::{RawFields, KEY_DEVICE, KEY_HUMIDITY, KEY_TEMPERATURE};

/// Validate decoded fields and build the immutable event.
///
/// `source_topic` is supplied by the caller; `received_at` is stamped here.
///
/// # Errors
/// - `MissingField` when a required key is absent, JSON null, or the device
///   string is empty
/// - `TypeMismatch` when a key holds the wrong JSON type
pub fn validate(fields: &RawFields, source_topic: &str) -> Result<TelemetryEvent, ValidationError> {
    let device = require_string(fields.device(), KEY_DEVICE)?;
    let temperature = require_number(fields.temperature(), KEY_TEMPERATURE)?;
    let humidity = require_number(fields.humidity(), KEY_HUMIDITY)?;

    Ok(TelemetryEvent::new(
        device,
        temperature,
        humidity,
        source_topic,
    ))
}

fn require_string<'a>(
    value: Option<&'a Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::String(s)) if s.is_empty() => {
            // The source treated an empty device string as missing
            Err(ValidationError::MissingField { field })
        }
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::TypeMismatch {
            field,
            expected: "string",
        }),
    }
}

fn require_number(value: Option<&Value>, field: &'static str) -> Result<f64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidationError::TypeMismatch {
            field,
            expected: "number",
        }),
        Some(_) => Err(ValidationError::TypeMismatch {
            field,
            expected: "number",
        }),
    }
}
