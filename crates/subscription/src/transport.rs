//! Broker transport seam and the rumqttc implementation
//!
//! The core only requires from the transport: deliver topic+payload pairs
//! after a successful subscribe, on a single logical receive channel.

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, instrument};

use contracts::{BrokerConfig, ConnectionError, InboundMessage};

/// Opens broker sessions. Each reconnect opens a fresh session.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Connect and subscribe; resolves once the broker has accepted both.
    ///
    /// # Errors
    /// Rejections map to the specific `ConnectionError` reason.
    async fn open(&mut self) -> Result<Box<dyn BrokerSession>, ConnectionError>;
}

/// One established, subscribed connection.
#[async_trait]
pub trait BrokerSession: Send {
    /// Next inbound message.
    ///
    /// # Errors
    /// `NetworkDrop` when the connection is lost.
    async fn next_message(&mut self) -> Result<InboundMessage, ConnectionError>;

    /// Tell the broker we are leaving; best effort
    async fn disconnect(&mut self);
}

/// Production transport over rumqttc.
pub struct MqttTransport {
    config: BrokerConfig,
}

impl MqttTransport {
    /// Create a transport from broker settings
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    fn client_id(&self) -> String {
        self.config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("mqtt-relay-{}", std::process::id()))
    }
}

#[async_trait]
impl BrokerTransport for MqttTransport {
    #[instrument(
        name = "mqtt_transport_open",
        skip(self),
        fields(host = %self.config.host, port = self.config.port, topic = %self.config.topic)
    )]
    async fn open(&mut self) -> Result<Box<dyn BrokerSession>, ConnectionError> {
        let mut options = MqttOptions::new(self.client_id(), &self.config.host, self.config.port);
        options.set_keep_alive(self.config.keep_alive());
        if !self.config.username.is_empty() {
            options.set_credentials(&self.config.username, &self.config.password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);

        // Queued until the event loop flushes it after ConnAck
        client
            .subscribe(&self.config.topic, QoS::AtMostOnce)
            .await
            .map_err(|e| ConnectionError::server_unavailable(e.to_string()))?;

        // Drive the loop until the subscribe is acknowledged
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(
                        host = %self.config.host,
                        port = self.config.port,
                        "Connected to broker"
                    );
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    info!(topic = %self.config.topic, "Subscribed");
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(map_connect_error(e)),
            }
        }

        Ok(Box::new(MqttSession { client, eventloop }))
    }
}

/// Established rumqttc session
struct MqttSession {
    client: AsyncClient,
    eventloop: rumqttc::EventLoop,
}

#[async_trait]
impl BrokerSession for MqttSession {
    async fn next_message(&mut self) -> Result<InboundMessage, ConnectionError> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(
                        topic = %publish.topic,
                        payload_size = publish.payload.len(),
                        "Message received"
                    );
                    return Ok(InboundMessage::new(publish.topic, publish.payload));
                }
                // Ping responses and outgoing packets just mean the
                // connection is healthy
                Ok(_) => {}
                Err(e) => return Err(ConnectionError::network_drop(e.to_string())),
            }
        }
    }

    async fn disconnect(&mut self) {
        let _ = self.client.disconnect().await;
    }
}

/// Map a rumqttc connect-phase error onto the rejection taxonomy.
fn map_connect_error(error: rumqttc::ConnectionError) -> ConnectionError {
    match error {
        rumqttc::ConnectionError::ConnectionRefused(code) => match code {
            ConnectReturnCode::RefusedProtocolVersion => ConnectionError::ProtocolMismatch,
            ConnectReturnCode::BadUserNamePassword => ConnectionError::BadCredentials,
            ConnectReturnCode::NotAuthorized | ConnectReturnCode::BadClientId => {
                ConnectionError::NotAuthorized
            }
            ConnectReturnCode::ServiceUnavailable => {
                ConnectionError::server_unavailable("broker reports service unavailable")
            }
            other => ConnectionError::server_unavailable(format!("connection refused: {other:?}")),
        },
        other => ConnectionError::server_unavailable(other.to_string()),
    }
}
