//! Telemetry forwarder
//!
//! Maps an incoming request onto the `{"request": {"ets", "events"}}`
//! envelope and posts it to the telemetry service. `forward` is
//! fire-and-forget: failures are logged and swallowed. `try_forward` runs
//! the same pipeline and hands the outcome back to the caller.

use std::sync::Arc;

use tracing::{Instrument, error, info, warn};

use crate::core::config::{TELEMETRY_API_PATH_KEY, TELEMETRY_BASE_URL_KEY};
use crate::core::{ConfigResolver, ForwarderSettings, PropertiesCache, TelemetryResult};
use crate::tracing_context::TracingContext;
use crate::transport::{DeliveryReport, Headers, HttpTransport, TelemetryTransport};
use crate::types::{IncomingRequest, OutboundPayload, TelemetryRequest};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Stateless dispatcher of telemetry envelopes
///
/// Holds only immutable collaborators, so one instance can be shared
/// across tasks behind an `Arc`.
#[derive(Clone)]
pub struct TelemetryForwarder<T = HttpTransport> {
    config: ConfigResolver,
    transport: T,
}

impl TelemetryForwarder<HttpTransport> {
    /// Build a forwarder over the process environment, the configured
    /// properties file and a reqwest client
    pub fn from_settings(settings: &ForwarderSettings) -> TelemetryResult<Self> {
        let properties = Arc::new(PropertiesCache::load_or_empty(settings.properties_path()));
        let transport = HttpTransport::with_timeout(settings.http_timeout)?;
        Ok(Self::new(ConfigResolver::from_env(properties), transport))
    }
}

impl<T: TelemetryTransport> TelemetryForwarder<T> {
    pub fn new(config: ConfigResolver, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Headers sent with every payload
    pub fn headers(&self) -> Headers {
        Headers::from([(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())])
    }

    /// Destination URL: base URL followed directly by the API path
    ///
    /// Resolved on every call. A missing value contributes nothing; the
    /// resulting URL is used as is.
    pub fn telemetry_url(&self) -> String {
        let base_url = self.config.config_value(TELEMETRY_BASE_URL_KEY);
        let api_path = self.config.property(TELEMETRY_API_PATH_KEY);

        if base_url.is_none() {
            warn!("No value configured for {}", TELEMETRY_BASE_URL_KEY);
        }
        if api_path.is_none() {
            warn!("No value configured for {}", TELEMETRY_API_PATH_KEY);
        }

        let url = format!(
            "{}{}",
            base_url.unwrap_or_default(),
            api_path.unwrap_or_default()
        );
        info!("Telemetry url = {}", url);
        url
    }

    /// Transform an incoming request into the outbound payload
    pub fn telemetry_request(&self, request: &IncomingRequest) -> OutboundPayload {
        let telemetry = TelemetryRequest::from_incoming(request);
        if telemetry.events.is_some() {
            info!("Events count = {}", telemetry.event_count());
        }
        OutboundPayload::new(telemetry.into())
    }

    /// Forward a request, logging and swallowing any failure
    pub async fn forward(&self, request: Option<&IncomingRequest>) {
        info!("Telemetry forward called");
        let Some(request) = request else {
            return;
        };

        let TracingContext {
            correlation_id,
            span,
        } = TracingContext::for_request(request);
        async {
            if let Err(e) = self.deliver(request).await {
                error!(
                    "Failed to send telemetry request {}: {}",
                    correlation_id, e
                );
                match self.telemetry_request(request).to_json() {
                    Ok(payload) => info!("Failure request = {}", payload),
                    Err(e) => error!("Failure request could not be serialized: {}", e),
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Forward a request and report the outcome
    ///
    /// Returns `Ok(None)` when there is no request to send.
    pub async fn try_forward(
        &self,
        request: Option<&IncomingRequest>,
    ) -> TelemetryResult<Option<DeliveryReport>> {
        info!("Telemetry forward called");
        let Some(request) = request else {
            return Ok(None);
        };

        let context = TracingContext::for_request(request);
        self.deliver(request)
            .instrument(context.span)
            .await
            .map(Some)
    }

    async fn deliver(&self, request: &IncomingRequest) -> TelemetryResult<DeliveryReport> {
        let body = self.telemetry_request(request).to_json()?;
        info!("Telemetry request: {}", body);

        let url = self.telemetry_url();
        let report = self.transport.post(&url, &self.headers(), body).await?;

        info!(
            "Request process status = {} {} ({:?})",
            report.status, report.body, report.elapsed
        );
        Ok(report)
    }
}
