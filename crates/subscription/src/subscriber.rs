//! Subscription lifecycle: connect, receive, reconnect
//!
//! A `Subscription` owns the broker side of the pipeline. It drives a
//! transport through the connection state machine, forwards inbound
//! messages into the bounded queue, and reconnects on network drops
//! according to the configured policy. Broker rejections are fatal.

use async_channel::{Sender, TrySendError};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use contracts::{ConnectionError, DropPolicy, InboundMessage, ReconnectPolicy};
use observability::metrics::{record_dropped, record_reconnect};

use crate::state::{StateTracker, SubscriptionState};
use crate::transport::{BrokerSession, BrokerTransport};

/// Why a receive loop ended.
enum SessionEnd {
    /// Connection lost; eligible for reconnect.
    Dropped(ConnectionError),
    /// Shutdown requested or the queue closed.
    Stop,
}

/// Owns one broker subscription and its reconnect loop.
pub struct Subscription {
    transport: Box<dyn BrokerTransport>,
    reconnect: ReconnectPolicy,
    drop_policy: DropPolicy,
    tx: Sender<InboundMessage>,
    state: StateTracker,
    shutdown: CancellationToken,
}

impl Subscription {
    pub fn new(
        transport: Box<dyn BrokerTransport>,
        reconnect: ReconnectPolicy,
        drop_policy: DropPolicy,
        tx: Sender<InboundMessage>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            transport,
            reconnect,
            drop_policy,
            tx,
            state: StateTracker::new(),
            shutdown,
        }
    }

    /// Handle for observing state transitions, mainly from tests.
    pub fn state_tracker(&self) -> StateTracker {
        self.state.clone()
    }

    /// Run until shutdown, a fatal rejection, or reconnect exhaustion.
    ///
    /// # Errors
    /// The first rejection, or the last drop once attempts run out.
    #[instrument(name = "subscription_run", skip(self))]
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        let mut attempt: u32 = 0;

        loop {
            self.state.transition(SubscriptionState::Connecting);

            let session = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested while connecting");
                    self.state.transition(SubscriptionState::Disconnected);
                    return Ok(());
                }
                opened = self.transport.open() => opened,
            };

            let mut session = match session {
                Ok(session) => session,
                Err(e) if e.is_rejection() => {
                    error!(error = %e, "Broker rejected the connection");
                    self.state.transition(SubscriptionState::Failed);
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Connect failed");
                    self.state.transition(SubscriptionState::Disconnected);
                    attempt += 1;
                    if self.reconnect.is_exhausted(attempt) {
                        self.state.transition(SubscriptionState::Failed);
                        return Err(e);
                    }
                    record_reconnect(attempt);
                    if self.wait_before_retry().await.is_err() {
                        return Ok(());
                    }
                    continue;
                }
            };

            attempt = 0;
            self.state.transition(SubscriptionState::Subscribed);

            match self.receive_loop(session.as_mut()).await {
                SessionEnd::Stop => {
                    session.disconnect().await;
                    self.state.transition(SubscriptionState::Disconnected);
                    return Ok(());
                }
                SessionEnd::Dropped(e) => {
                    warn!(error = %e, "Connection lost");
                    self.state.transition(SubscriptionState::Disconnected);
                    attempt += 1;
                    if self.reconnect.is_exhausted(attempt) {
                        self.state.transition(SubscriptionState::Failed);
                        return Err(e);
                    }
                    record_reconnect(attempt);
                    if self.wait_before_retry().await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn receive_loop(&mut self, session: &mut dyn BrokerSession) -> SessionEnd {
        loop {
            let message = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    return SessionEnd::Stop;
                }
                received = session.next_message() => received,
            };

            match message {
                Ok(message) => {
                    if !self.forward(message).await {
                        return SessionEnd::Stop;
                    }
                }
                Err(e) => return SessionEnd::Dropped(e),
            }
        }
    }

    /// Hand a message to the queue. Returns false when the queue closed.
    async fn forward(&self, message: InboundMessage) -> bool {
        match self.drop_policy {
            DropPolicy::Block => self.tx.send(message).await.is_ok(),
            DropPolicy::DropNewest => match self.tx.try_send(message) {
                Ok(()) => true,
                Err(TrySendError::Full(message)) => {
                    record_dropped();
                    warn!(topic = %message.topic, "Queue full, dropping message");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            },
        }
    }

    /// Sleep out the reconnect delay; Err means shutdown arrived first.
    async fn wait_before_retry(&self) -> Result<(), ()> {
        let delay = self.reconnect.delay();
        debug!(delay_secs = delay.as_secs(), "Waiting before reconnect");
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(()),
            _ = sleep(delay) => Ok(()),
        }
    }
}

/// Spawn the subscription onto the runtime.
pub fn spawn(
    subscription: Subscription,
) -> tokio::task::JoinHandle<Result<(), ConnectionError>> {
    tokio::spawn(subscription.run())
}
