//! # Integration Tests
//!
//! End-to-end tests across the relay crates.
//!
//! Covers:
//! - full flow: broker transport -> subscription -> queue -> dispatcher -> sink
//! - reconnect with delivery resumption
//! - configuration-driven pipeline wiring

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio_util::sync::CancellationToken;

    use contracts::{
        ConnectionError, DeliveryError, DropPolicy, InboundMessage, ReconnectPolicy, RetryPolicy,
        TelemetryEvent, TelemetrySink,
    };
    use dispatcher::{Dispatcher, PipelineMetrics};
    use subscription::{BrokerSession, BrokerTransport, Subscription};

    /// One scripted step of a broker session.
    enum Step {
        Deliver(InboundMessage),
        Drop(ConnectionError),
        Hold,
    }

    struct ScriptedSession {
        steps: VecDeque<Step>,
    }

    #[async_trait]
    impl BrokerSession for ScriptedSession {
        async fn next_message(&mut self) -> Result<InboundMessage, ConnectionError> {
            match self.steps.pop_front() {
                Some(Step::Deliver(message)) => Ok(message),
                Some(Step::Drop(e)) => Err(e),
                Some(Step::Hold) | None => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }

        async fn disconnect(&mut self) {}
    }

    struct ScriptedTransport {
        sessions: VecDeque<Vec<Step>>,
    }

    #[async_trait]
    impl BrokerTransport for ScriptedTransport {
        async fn open(&mut self) -> Result<Box<dyn BrokerSession>, ConnectionError> {
            match self.sessions.pop_front() {
                Some(steps) => Ok(Box::new(ScriptedSession {
                    steps: steps.into(),
                })),
                None => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    /// Sink that records every delivered event.
    struct RecordingSink {
        events: Arc<Mutex<Vec<TelemetryEvent>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl TelemetrySink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&mut self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), DeliveryError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage::new(topic, Bytes::copy_from_slice(payload.as_bytes()))
    }

    fn reconnect(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            delay_secs: 0,
        }
    }

    const VALID_A: &str = r#"{"Device":"E89F6DE8F3BC","Temperature":24.5,"Humidity":77}"#;
    const VALID_B: &str = r#"{"Device":"AABBCCDDEEFF","Temperature":19,"Humidity":60.5}"#;
    const MALFORMED: &str = "not json at all";

    /// Full flow: transport -> subscription -> queue -> dispatcher -> sink.
    ///
    /// A malformed payload in the middle is counted and skipped while the
    /// valid payloads around it are delivered.
    #[tokio::test]
    async fn test_e2e_pipeline_delivers_valid_payloads() {
        let (tx, rx) = async_channel::bounded(16);

        let transport = ScriptedTransport {
            sessions: vec![vec![
                Step::Deliver(message("/arduino/dht/E89F6DE8F3BC", VALID_A)),
                Step::Deliver(message("/arduino/dht/E89F6DE8F3BC", MALFORMED)),
                Step::Deliver(message("/arduino/dht/AABBCCDDEEFF", VALID_B)),
                Step::Hold,
            ]]
            .into(),
        };

        let shutdown = CancellationToken::new();
        let subscription = Subscription::new(
            Box::new(transport),
            reconnect(1),
            DropPolicy::Block,
            tx,
            shutdown.clone(),
        );
        let subscription_handle = subscription::spawn(subscription);

        let events = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(false));
        let metrics = Arc::new(PipelineMetrics::new());
        let sink = RecordingSink {
            events: events.clone(),
            closed: closed.clone(),
        };
        let dispatcher_handle =
            Dispatcher::new(sink, RetryPolicy::default(), metrics.clone()).spawn(rx);

        // Wait until both valid events have landed
        tokio::time::timeout(Duration::from_secs(2), async {
            while metrics.received_count() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("pipeline did not process all messages");

        shutdown.cancel();
        subscription_handle.await.unwrap().unwrap();
        dispatcher_handle.await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].device_id, "E89F6DE8F3BC");
        assert_eq!(events[0].temperature, 24.5);
        assert_eq!(events[0].humidity, 77.0);
        assert_eq!(events[0].source_topic, "/arduino/dht/E89F6DE8F3BC");
        assert_eq!(events[1].device_id, "AABBCCDDEEFF");

        assert_eq!(metrics.decode_error_count(), 1);
        assert_eq!(metrics.delivered_count(), 2);
        assert!(*closed.lock().unwrap(), "sink should be closed on drain");
    }

    /// Delivery resumes on a fresh session after a network drop.
    #[tokio::test]
    async fn test_e2e_reconnect_resumes_delivery() {
        let (tx, rx) = async_channel::bounded(16);

        let transport = ScriptedTransport {
            sessions: vec![
                vec![
                    Step::Deliver(message("/arduino/dht/E89F6DE8F3BC", VALID_A)),
                    Step::Drop(ConnectionError::network_drop("broken pipe")),
                ],
                vec![
                    Step::Deliver(message("/arduino/dht/AABBCCDDEEFF", VALID_B)),
                    Step::Hold,
                ],
            ]
            .into(),
        };

        let shutdown = CancellationToken::new();
        let subscription = Subscription::new(
            Box::new(transport),
            reconnect(0),
            DropPolicy::Block,
            tx,
            shutdown.clone(),
        );
        let subscription_handle = subscription::spawn(subscription);

        let events = Arc::new(Mutex::new(Vec::new()));
        let metrics = Arc::new(PipelineMetrics::new());
        let sink = RecordingSink {
            events: events.clone(),
            closed: Arc::new(Mutex::new(false)),
        };
        let dispatcher_handle =
            Dispatcher::new(sink, RetryPolicy::default(), metrics.clone()).spawn(rx);

        tokio::time::timeout(Duration::from_secs(2), async {
            while metrics.delivered_count() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("delivery did not resume after reconnect");

        shutdown.cancel();
        subscription_handle.await.unwrap().unwrap();
        dispatcher_handle.await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].device_id, "E89F6DE8F3BC");
        assert_eq!(events[1].device_id, "AABBCCDDEEFF");
    }

    /// A configuration drives the wiring end to end.
    #[tokio::test]
    async fn test_e2e_config_driven_console_pipeline() {
        let content = r#"
[broker]
host = "broker.emqx.io"

[queue]
capacity = 4

[sink]
name = "console"
sink_type = "console"
"#;
        let blueprint =
            config_loader::ConfigLoader::load_from_str(content, config_loader::ConfigFormat::Toml)
                .unwrap();

        let (tx, rx) = async_channel::bounded(blueprint.queue.capacity);
        let metrics = Arc::new(PipelineMetrics::new());
        let handle =
            dispatcher::spawn_from_config(&blueprint.sink, blueprint.retry, rx, metrics.clone())
                .unwrap();

        tx.send(message("/arduino/dht/E89F6DE8F3BC", VALID_A))
            .await
            .unwrap();
        tx.send(message("/arduino/dht/E89F6DE8F3BC", MALFORMED))
            .await
            .unwrap();
        drop(tx);

        handle.await.unwrap();

        assert_eq!(metrics.received_count(), 2);
        assert_eq!(metrics.delivered_count(), 1);
        assert_eq!(metrics.decode_error_count(), 1);
    }
}
