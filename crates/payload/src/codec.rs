//! PayloadCodec - raw bytes to untyped fields
//!
//! The wire format is fixed: UTF-8 JSON object with case-sensitive keys
//! `Device`, `Temperature`, `Humidity`. Unknown keys are ignored.

use contracts::DecodeError;
use serde_json::{Map, Value};

/// Required wire keys, exact names
pub const KEY_DEVICE: &str = "Device";
pub const KEY_TEMPERATURE: &str = "Temperature";
pub const KEY_HUMIDITY: &str = "Humidity";

/// The three raw JSON values as published, untyped.
///
/// Numbers may arrive as int or float; the validator coerces them.
#[derive(Debug, Clone)]
pub struct RawFields {
    fields: Map<String, Value>,
}

impl RawFields {
    /// Raw value under `Device`, if present
    pub fn device(&self) -> Option<&Value> {
        self.fields.get(KEY_DEVICE)
    }

    /// Raw value under `Temperature`, if present
    pub fn temperature(&self) -> Option<&Value> {
        self.fields.get(KEY_TEMPERATURE)
    }

    /// Raw value under `Humidity`, if present
    pub fn humidity(&self) -> Option<&Value> {
        self.fields.get(KEY_HUMIDITY)
    }
}

/// Decode raw payload bytes into untyped fields.
///
/// # Errors
/// - `DecodeError::Encoding` when the bytes are not valid UTF-8
/// - `DecodeError::Malformed` when the text is not a JSON object
pub fn decode(raw: &[u8]) -> Result<RawFields, DecodeError> {
    let text = std::str::from_utf8(raw)?;

    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::malformed(e.to_string()))?;

    match value {
        Value::Object(fields) => Ok(RawFields { fields }),
        other => Err(DecodeError::malformed(format!(
            "expected a json object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_payload() {
        let raw = br#"{"Device":"E89F6DE8F3BC","Temperature":24,"Humidity":77}"#;
        let fields = decode(raw).unwrap();
        assert_eq!(fields.device().unwrap(), "E89F6DE8F3BC");
        assert_eq!(fields.temperature().unwrap(), 24);
        assert_eq!(fields.humidity().unwrap(), 77);
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let raw = br#"{"Device":"d","Temperature":1,"Humidity":2,"Rssi":-60}"#;
        let fields = decode(raw).unwrap();
        assert!(fields.device().is_some());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let raw = [0xff, 0xfe, b'{', b'}'];
        let err = decode(&raw).unwrap_err();
        assert!(matches!(err, DecodeError::Encoding(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = decode(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode(b"[1,2,3]").unwrap_err();
        match err {
            DecodeError::Malformed { message } => assert!(message.contains("array")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let raw = br#"{"device":"d","temperature":1,"humidity":2}"#;
        let fields = decode(raw).unwrap();
        assert!(fields.device().is_none());
        assert!(fields.temperature().is_none());
    }
}
