//! Correlation ID and tracing context management
//!
//! Every forwarded request runs inside a span carrying a correlation ID so
//! the log lines of one call (URL, payload, outcome, failure) can be
//! grouped together. The platform request `id` is reused when present.

use tracing::Span;
use uuid::Uuid;

use crate::types::IncomingRequest;

/// A correlation ID that identifies one forward call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a UUID-based correlation ID
    pub fn new_uuid() -> Self {
        CorrelationId(Uuid::new_v4().to_string())
    }

    /// Create a correlation ID from a caller supplied value
    pub fn from_string(id: String) -> Self {
        CorrelationId(id)
    }

    /// Reuse the request id, or generate one when the request has none
    pub fn for_request(request: &IncomingRequest) -> Self {
        match request.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Self::from_string(id.to_string()),
            _ => Self::new_uuid(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracing context that holds correlation and span information
#[derive(Debug, Clone)]
pub struct TracingContext {
    pub correlation_id: CorrelationId,
    pub span: Span,
}

impl TracingContext {
    /// Create the context for forwarding `request`
    pub fn for_request(request: &IncomingRequest) -> Self {
        let correlation_id = CorrelationId::for_request(request);
        let span = tracing::info_span!(
            "telemetry_forward",
            correlation_id = %correlation_id,
            request_ver = %request.ver.as_deref().unwrap_or("-"),
            component = "telemetry-forwarder"
        );

        Self {
            correlation_id,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_uuid() {
        let id1 = CorrelationId::new_uuid();
        let id2 = CorrelationId::new_uuid();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_correlation_id_reuses_request_id() {
        let mut request = IncomingRequest::default();
        request.id = Some("api.telemetry".to_string());

        let context = TracingContext::for_request(&request);
        assert_eq!(context.correlation_id.as_str(), "api.telemetry");
        assert_eq!(context.correlation_id.to_string(), "api.telemetry");
    }

    #[test]
    fn test_correlation_id_generated_without_request_id() {
        let mut request = IncomingRequest::default();
        assert_eq!(CorrelationId::for_request(&request).as_str().len(), 36);

        request.id = Some("   ".to_string());
        let id = CorrelationId::for_request(&request);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
