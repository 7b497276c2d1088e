//! InboundMessage - Subscription output
//!
//! Raw (topic, payload) pair handed from the broker loop to the dispatcher.

use bytes::Bytes;

/// One raw message as received from the broker.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Topic the message was published on
    pub topic: String,

    /// Raw payload bytes (zero-copy)
    pub payload: Bytes,
}

impl InboundMessage {
    /// Create a new inbound message
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}
