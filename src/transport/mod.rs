//! Outbound transport for telemetry payloads
//! Pluggable so the forwarder can be driven against the real HTTP client
//! or an in-memory recorder

use crate::core::TelemetryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

pub mod http;
pub mod recording;

pub use http::HttpTransport;
pub use recording::{RecordedPost, RecordingTransport};

/// Request headers as plain name/value pairs
pub type Headers = HashMap<String, String>;

/// Outcome of one successful POST
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    /// HTTP status code returned by the service
    pub status: u16,
    /// Response body, as text
    pub body: String,
    /// When the response was received
    pub sent_at: DateTime<Utc>,
    /// Round trip time of the call
    pub elapsed: Duration,
}

/// TelemetryTransport trait for sending one serialized payload
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// POST `body` to `url`; non-success statuses are errors
    async fn post(&self, url: &str, headers: &Headers, body: String)
    -> TelemetryResult<DeliveryReport>;
}
