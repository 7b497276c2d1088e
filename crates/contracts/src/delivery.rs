//! DeliveryResult - outcome of one message through the pipeline
//!
//! Not persisted; used for logging/metrics by the dispatcher caller.

use crate::DeliveryError;

/// What stage a failed message died at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Payload bytes could not be decoded
    Decode,
    /// Decoded payload failed field validation
    Validation,
    /// Storage collaborator unavailable
    StoreUnavailable,
    /// HTTP transport failed or returned non-200
    TransportFailure,
    /// Sink output stream unusable
    SinkIo,
}

/// Outcome of handling one inbound message.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub succeeded: bool,
    pub error_kind: Option<FailureKind>,
    pub detail: String,
}

impl DeliveryResult {
    /// A successful delivery
    pub fn ok() -> Self {
        Self {
            succeeded: true,
            error_kind: None,
            detail: String::new(),
        }
    }

    /// A failed delivery with the stage it failed at
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_kind: Some(kind),
            detail: detail.into(),
        }
    }
}

impl From<&DeliveryError> for FailureKind {
    fn from(err: &DeliveryError) -> Self {
        match err {
            DeliveryError::StoreUnavailable { .. } => Self::StoreUnavailable,
            DeliveryError::TransportFailure { .. } => Self::TransportFailure,
            DeliveryError::Io(_) => Self::SinkIo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_from_delivery_error() {
        let err = DeliveryError::store_unavailable("down");
        assert_eq!(FailureKind::from(&err), FailureKind::StoreUnavailable);

        let err = DeliveryError::transport_failure(Some(502), "bad gateway");
        assert_eq!(FailureKind::from(&err), FailureKind::TransportFailure);
    }

    #[test]
    fn test_ok_result() {
        let result = DeliveryResult::ok();
        assert!(result.succeeded);
        assert!(result.error_kind.is_none());
    }
}
