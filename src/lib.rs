//! Telemetry forwarder
//!
//! Wraps the `ets` timestamp and `events` list of an in-process request in a
//! `{"request": {...}}` envelope and posts it as JSON to the telemetry
//! service configured by `sunbird_telemetry_base_url` and
//! `sunbird_telemetry_api_path`.

pub mod core;
pub mod forwarder;
pub mod tracing_context;
pub mod transport;
pub mod types;

pub use crate::core::{TelemetryError, TelemetryResult};
pub use forwarder::TelemetryForwarder;
pub use types::{IncomingRequest, OutboundPayload, TelemetryEnvelope, TelemetryRequest};
