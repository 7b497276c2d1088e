//! Layered error definitions
//!
//! Categorized by pipeline stage: decode / validate / deliver / connect / config.

use thiserror::Error;

/// Payload decode failure (stage 1 of the pipeline).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload bytes are not valid UTF-8
    #[error("payload is not valid utf-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Payload text is not a JSON object
    #[error("payload is not a json object: {message}")]
    Malformed { message: String },
}

impl DecodeError {
    /// Create a malformed-payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Field validation failure (stage 2 of the pipeline).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Required key absent, JSON null, or an empty device string
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// Key present but with the wrong JSON type
    #[error("field '{field}' has wrong type: expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => field,
            Self::TypeMismatch { field, .. } => field,
        }
    }
}

/// Sink delivery failure (stage 3 of the pipeline).
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Storage connection/statement failed
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// HTTP transport failed or returned a non-200 status
    #[error("transport failure{}: {message}", fmt_status(.status))]
    TransportFailure {
        status: Option<u16>,
        message: String,
    },

    /// Output stream itself is unusable (console sink only, treated as fatal)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

impl DeliveryError {
    /// Create a store-unavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create a transport failure with an optional observed HTTP status
    pub fn transport_failure(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status,
            message: message.into(),
        }
    }
}

/// Broker connection failure.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("broker rejected connection: bad credentials")]
    BadCredentials,

    #[error("broker rejected connection: protocol mismatch")]
    ProtocolMismatch,

    #[error("broker unavailable: {message}")]
    ServerUnavailable { message: String },

    #[error("broker rejected connection: not authorized")]
    NotAuthorized,

    /// Established connection dropped; triggers reconnect per policy
    #[error("network drop: {message}")]
    NetworkDrop { message: String },
}

impl ConnectionError {
    /// Create a server-unavailable error
    pub fn server_unavailable(message: impl Into<String>) -> Self {
        Self::ServerUnavailable {
            message: message.into(),
        }
    }

    /// Create a network-drop error
    pub fn network_drop(message: impl Into<String>) -> Self {
        Self::NetworkDrop {
            message: message.into(),
        }
    }

    /// A rejection during initial connect is fatal unless a reconnect
    /// policy is configured; a drop of an established connection is not.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::NetworkDrop { .. } | Self::ServerUnavailable { .. })
    }
}

/// Configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a configuration parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::MissingField { field: "Device" };
        assert_eq!(err.field(), "Device");
        assert!(err.to_string().contains("Device"));
    }

    #[test]
    fn test_transport_failure_displays_status() {
        let err = DeliveryError::transport_failure(Some(500), "server error");
        assert!(err.to_string().contains("500"));

        let err = DeliveryError::transport_failure(None, "connection refused");
        assert!(!err.to_string().contains("status"));
    }

    #[test]
    fn test_rejection_classification() {
        assert!(ConnectionError::BadCredentials.is_rejection());
        assert!(ConnectionError::NotAuthorized.is_rejection());
        assert!(!ConnectionError::network_drop("eof").is_rejection());
    }
}
