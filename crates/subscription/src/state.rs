//! Subscription connection state machine
//!
//! `Disconnected -> Connecting -> Subscribed -> Disconnected` on drop, back
//! to `Connecting` per the reconnect policy; `Failed` is terminal and only
//! reached when a bounded policy is exhausted.

use std::sync::{Arc, Mutex};

use tracing::debug;

/// Connection states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Disconnected,
    Connecting,
    Subscribed,
    /// Terminal, bounded reconnect policy exhausted
    Failed,
}

/// Observable state with transition history.
///
/// Exactly one instance per running subscription; clones share state.
#[derive(Clone)]
pub struct StateTracker {
    inner: Arc<Mutex<Vec<SubscriptionState>>>,
}

impl StateTracker {
    /// New tracker, starting Disconnected
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(vec![SubscriptionState::Disconnected])),
        }
    }

    /// Record a transition; repeated identical states collapse
    pub fn transition(&self, to: SubscriptionState) {
        let mut states = self.inner.lock().expect("state lock poisoned");
        let current = *states.last().expect("state history never empty");
        if current != to {
            debug!(from = ?current, to = ?to, "Subscription state transition");
            states.push(to);
        }
    }

    /// Current state
    pub fn current(&self) -> SubscriptionState {
        *self
            .inner
            .lock()
            .expect("state lock poisoned")
            .last()
            .expect("state history never empty")
    }

    /// Full transition history since start
    pub fn history(&self) -> Vec<SubscriptionState> {
        self.inner.lock().expect("state lock poisoned").clone()
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
