//! RestSink - HTTP forward to a remote endpoint
//!
//! One request per event with parameters `MAC`, `T`, `H`. HTTP 200 is the
//! only success status; anything else, or a transport-level failure, yields
//! a `TransportFailure` with the observed status when there is one.

use std::collections::HashMap;
use std::time::Duration;

use contracts::{DeliveryError, TelemetryEvent, TelemetrySink};
use tracing::{debug, info, instrument};

use super::fmt_reading;

/// HTTP method for the forward request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestMethod {
    /// Readings passed as query-string parameters
    #[default]
    Get,
    /// Form-encoded POST
    Post,
}

/// Sink that forwards each event to a configured HTTP endpoint.
pub struct RestSink {
    name: String,
    client: reqwest::Client,
    base_url: String,
    method: RestMethod,
}

impl RestSink {
    /// Create a RestSink with an explicit method and per-call timeout
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        method: RestMethod,
        timeout: Duration,
    ) -> Result<Self, String> {
        let base_url = base_url.into();
        reqwest::Url::parse(&base_url).map_err(|e| format!("invalid base url: {e}"))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build http client: {e}"))?;

        Ok(Self {
            name: name.into(),
            client,
            base_url,
            method,
        })
    }

    /// Create from config params (for the sink factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, String> {
        let base_url = params
            .get("base_url")
            .ok_or_else(|| "missing 'base_url' parameter".to_string())?;

        let method = match params.get("method").map(String::as_str) {
            Some("post") => RestMethod::Post,
            Some("get") | None => RestMethod::Get,
            Some(other) => return Err(format!("unknown method '{other}'")),
        };

        let timeout_secs = params
            .get("timeout_secs")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self::new(name, base_url, method, Duration::from_secs(timeout_secs))
    }

    fn request_params(event: &TelemetryEvent) -> [(&'static str, String); 3] {
        [
            ("MAC", event.device_id.clone()),
            ("T", fmt_reading(event.temperature)),
            ("H", fmt_reading(event.humidity)),
        ]
    }
}

impl TelemetrySink for RestSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "rest_sink_deliver",
        skip(self, event),
        fields(sink = %self.name, device_id = %event.device_id)
    )]
    async fn deliver(&mut self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
        let params = Self::request_params(event);

        let request = match self.method {
            RestMethod::Get => self.client.get(&self.base_url).query(&params),
            RestMethod::Post => self.client.post(&self.base_url).form(&params),
        };

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::transport_failure(None, e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::transport_failure(
                Some(status),
                format!("unexpected status: {body}"),
            ));
        }

        debug!(sink = %self.name, status, "Event forwarded");
        Ok(())
    }

    #[instrument(name = "rest_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), DeliveryError> {
        info!(sink = %self.name, "RestSink closed");
        Ok(())
    }
}
