//! In-memory transport for testing and dry runs

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{DeliveryReport, Headers, TelemetryTransport};
use crate::core::{TelemetryError, TelemetryResult};

/// One POST captured by the recording transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPost {
    pub url: String,
    pub headers: Headers,
    pub body: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Status(u16, String),
    Unreachable(String),
}

/// Transport that records every POST and answers with a fixed reply
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    reply: Reply,
    posts: Arc<Mutex<Vec<RecordedPost>>>,
}

impl RecordingTransport {
    /// Answer every POST with `200` and `body`
    pub fn ok<S: Into<String>>(body: S) -> Self {
        Self::with_status(200, body)
    }

    /// Answer every POST with the given status and body
    pub fn with_status<S: Into<String>>(status: u16, body: S) -> Self {
        Self {
            reply: Reply::Status(status, body.into()),
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every POST as if the service could not be reached
    pub fn unreachable<S: Into<String>>(reason: S) -> Self {
        Self {
            reply: Reply::Unreachable(reason.into()),
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of every POST received so far
    pub async fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().await.clone()
    }
}

#[async_trait]
impl TelemetryTransport for RecordingTransport {
    async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: String,
    ) -> TelemetryResult<DeliveryReport> {
        debug!("Recording POST to {}", url);
        self.posts.lock().await.push(RecordedPost {
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });

        match &self.reply {
            Reply::Status(status, body) if (200..300).contains(status) => Ok(DeliveryReport {
                status: *status,
                body: body.clone(),
                sent_at: Utc::now(),
                elapsed: Duration::ZERO,
            }),
            Reply::Status(status, body) => Err(TelemetryError::status(*status, body.clone())),
            Reply::Unreachable(reason) => Err(anyhow::anyhow!("{}", reason).into()),
        }
    }
}
