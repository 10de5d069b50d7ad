//! Data structures for telemetry forwarding
//! Contains the caller-facing request container, the validated telemetry
//! fields, and the envelope that goes over the wire

use crate::core::TelemetryResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Key of the event timestamp inside a request map
pub const ETS: &str = "ets";
/// Key of the event list inside a request map
pub const EVENTS: &str = "events";
/// Key wrapping the envelope in the outbound payload
pub const REQUEST: &str = "request";

/// Request container handed to the forwarder
///
/// `request` is an opaque map; only `ets` and `events` are read from it.
/// `id` and `ver` mirror the platform request header and only label the
/// log span of a forward call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    #[serde(default)]
    pub request: Map<String, Value>,
}

impl IncomingRequest {
    /// Wrap a bare key/value map
    pub fn from_map(request: Map<String, Value>) -> Self {
        Self {
            id: None,
            ver: None,
            request,
        }
    }

    /// Build a request from arbitrary JSON
    ///
    /// An object with an object-valued `request` key is read as a full
    /// platform request; any other object is taken as the bare map.
    /// Header fields that are not strings are ignored. Non-object input
    /// yields an empty map.
    pub fn from_value(value: Value) -> TelemetryResult<Self> {
        match value {
            Value::Object(mut map) if matches!(map.get(REQUEST), Some(Value::Object(_))) => {
                let header = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                let id = header("id");
                let ver = header("ver");
                let request = match map.remove(REQUEST) {
                    Some(Value::Object(request)) => request,
                    _ => Map::new(),
                };
                Ok(Self { id, ver, request })
            }
            Value::Object(map) => Ok(Self::from_map(map)),
            other => {
                warn!("Request is not a JSON object, treating as empty: {}", other);
                Ok(Self::default())
            }
        }
    }

    /// Parse a request from JSON text
    pub fn from_json_str(input: &str) -> TelemetryResult<Self> {
        Self::from_value(serde_json::from_str(input)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.request.get(key)
    }
}

impl From<Map<String, Value>> for IncomingRequest {
    fn from(request: Map<String, Value>) -> Self {
        Self::from_map(request)
    }
}

/// Telemetry fields validated once at the request boundary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryRequest {
    pub ets: Option<i64>,
    pub events: Option<Vec<Value>>,
}

impl TelemetryRequest {
    /// Extract `ets` and `events` from an incoming request
    ///
    /// `ets` survives only as an integer, wrapped to 64 bits when it exceeds
    /// `i64::MAX`. `events` survives only as a non-empty array, copied
    /// verbatim. Anything else is dropped.
    pub fn from_incoming(incoming: &IncomingRequest) -> Self {
        let ets = incoming.get(ETS).and_then(|value| match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|u| u as i64)),
            _ => None,
        });

        let events = match incoming.get(EVENTS) {
            Some(Value::Array(events)) if !events.is_empty() => Some(events.clone()),
            _ => None,
        };

        Self { ets, events }
    }

    pub fn event_count(&self) -> usize {
        self.events.as_ref().map_or(0, Vec::len)
    }
}

/// One telemetry submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ets: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Value>>,
}

impl From<TelemetryRequest> for TelemetryEnvelope {
    fn from(request: TelemetryRequest) -> Self {
        Self {
            ets: request.ets,
            events: request.events,
        }
    }
}

/// The exact body sent to the telemetry service: `{"request": envelope}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub request: TelemetryEnvelope,
}

impl OutboundPayload {
    pub fn new(request: TelemetryEnvelope) -> Self {
        Self { request }
    }

    /// Serialize to compact JSON text
    pub fn to_json(&self) -> TelemetryResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
