//! # Subscription
//!
//! Broker connection lifecycle: connect, subscribe, reconnect-on-drop.
//!
//! Owns the single broker connection and feeds raw (topic, payload) pairs
//! into the dispatch queue. The transport is abstracted behind
//! `BrokerTransport` so the state machine is testable without a broker;
//! the production transport drives a rumqttc event loop.

pub mod state;
pub mod subscriber;
pub mod transport;

pub use state::{StateTracker, SubscriptionState};
pub use subscriber::{spawn, Subscription};
pub use transport::{BrokerSession, BrokerTransport, MqttTransport};
