//! Error types for the telemetry forwarder
//! Structured error handling using thiserror, one variant per failure site

use thiserror::Error;

/// Main error type for telemetry forwarding
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Payload could not be serialized or the input could not be parsed
    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    /// Network or request construction failure inside the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The telemetry service answered with a non-success status
    #[error("Telemetry service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Filesystem errors (properties file, CLI input)
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// Generic error for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for convenience
pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;

impl TelemetryError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a status error from a response status and body
    pub fn status<S: Into<String>>(status: u16, body: S) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether the failure happened before anything reached the wire
    pub fn is_local(&self) -> bool {
        match self {
            Self::Configuration { .. } | Self::Serialization(_) | Self::Io(_) => true,
            Self::Transport(e) => e.is_builder(),
            Self::Status { .. } | Self::Other(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = TelemetryError::status(503, "unavailable");
        assert_eq!(
            err.to_string(),
            "Telemetry service returned status 503: unavailable"
        );
        assert!(!err.is_local());
    }

    #[test]
    fn test_config_error_is_local() {
        let err = TelemetryError::config("missing base url");
        assert!(err.to_string().contains("missing base url"));
        assert!(err.is_local());
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: TelemetryError = parse.unwrap_err().into();
        assert!(matches!(err, TelemetryError::Serialization(_)));
    }
}
