//! ConsoleSink - human-readable lines on stdout

use std::io::Write;

use contracts::{DeliveryError, TelemetryEvent, TelemetrySink};
use tracing::{info, instrument};

use super::fmt_reading;

/// Sink that prints each event as one human-readable line.
///
/// Always succeeds unless the output stream itself is unusable.
pub struct ConsoleSink {
    name: String,
    writer: Box<dyn Write + Send>,
}

impl ConsoleSink {
    /// Create a ConsoleSink writing to stdout
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_writer(name, Box::new(std::io::stdout()))
    }

    /// Create a ConsoleSink with a custom output stream
    pub fn with_writer(name: impl Into<String>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    fn format_line(event: &TelemetryEvent) -> String {
        format!(
            "{} {} device={} temperature={} humidity={}",
            event.received_at.format("%Y-%m-%d %H:%M:%S%.3f"),
            event.source_topic,
            event.device_id,
            fmt_reading(event.temperature),
            fmt_reading(event.humidity),
        )
    }
}

impl TelemetrySink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "console_sink_deliver",
        skip(self, event),
        fields(sink = %self.name, device_id = %event.device_id)
    )]
    async fn deliver(&mut self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
        writeln!(self.writer, "{}", Self::format_line(event))?;
        self.writer.flush()?;
        Ok(())
    }

    #[instrument(name = "console_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), DeliveryError> {
        self.writer.flush()?;
        info!(sink = %self.name, "ConsoleSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Captures writes for inspection
    #[derive(Clone)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_output_contains_values_verbatim() {
        let buffer = SharedBuffer(Arc::new(Mutex::new(Vec::new())));
        let mut sink = ConsoleSink::with_writer("console", Box::new(buffer.clone()));

        let event =
            TelemetryEvent::new("E89F6DE8F3BC", 24.0, 77.0, "/arduino/dht/E89F6DE8F3BC");
        sink.deliver(&event).await.unwrap();

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("E89F6DE8F3BC"));
        assert!(output.contains("temperature=24"));
        assert!(output.contains("humidity=77"));
    }

    #[tokio::test]
    async fn test_deliver_never_fails_on_well_formed_event() {
        let buffer = SharedBuffer(Arc::new(Mutex::new(Vec::new())));
        let mut sink = ConsoleSink::with_writer("console", Box::new(buffer));

        for i in 0..10 {
            let event = TelemetryEvent::new("dev", i as f64, 50.0, "t");
            assert!(sink.deliver(&event).await.is_ok());
        }
    }

    #[test]
    fn test_fractional_readings_formatted() {
        let event = TelemetryEvent::new("d", 23.7, 55.2, "t");
        let line = ConsoleSink::format_line(&event);
        assert!(line.contains("temperature=23.7"));
        assert!(line.contains("humidity=55.2"));
    }
}
