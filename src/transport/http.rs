use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use super::{DeliveryReport, Headers, TelemetryTransport};

use crate::core::{TelemetryError, TelemetryResult};

/// HTTP transport for posting telemetry payloads with reqwest
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    pub(crate) client: Client,
}

impl HttpTransport {
    /// Create a transport with the client defaults (no request timeout)
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a transport, optionally bounding every request by `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> TelemetryResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl TelemetryTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: String,
    ) -> TelemetryResult<DeliveryReport> {
        let started = Instant::now();

        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            debug!("Telemetry service accepted payload: {}", status);
            Ok(DeliveryReport {
                status: status.as_u16(),
                body: text,
                sent_at: Utc::now(),
                elapsed: started.elapsed(),
            })
        } else {
            error!("Telemetry service rejected payload: {}", status);
            Err(TelemetryError::status(status.as_u16(), text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single canned HTTP response and hand back the raw request
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            if name.eq_ignore_ascii_case("content-length") {
                                value.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8(raw).unwrap()
        });

        (format!("http://{}", addr), handle)
    }

    fn json_headers() -> Headers {
        Headers::from([("Content-Type".to_string(), "application/json".to_string())])
    }

    #[tokio::test]
    async fn test_post_success() {
        let (base, server) = one_shot_server("200 OK", r#"{"result":"ok"}"#).await;
        let transport = HttpTransport::new();

        let report = transport
            .post(
                &format!("{}/v1/telemetry", base),
                &json_headers(),
                r#"{"request":{}}"#.to_string(),
            )
            .await
            .unwrap();

        assert_eq!(report.status, 200);
        assert_eq!(report.body, r#"{"result":"ok"}"#);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1/telemetry HTTP/1.1"));
        assert!(raw.to_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"request":{}}"#));
    }

    #[tokio::test]
    async fn test_post_non_success_status() {
        let (base, server) = one_shot_server("500 Internal Server Error", "boom").await;
        let transport = HttpTransport::with_timeout(Some(Duration::from_secs(5))).unwrap();

        let err = transport
            .post(&base, &json_headers(), "{}".to_string())
            .await
            .unwrap_err();

        match err {
            TelemetryError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_post_malformed_url() {
        let transport = HttpTransport::new();
        let err = transport
            .post("/v1/telemetry", &json_headers(), "{}".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, TelemetryError::Transport(_)));
        assert!(err.is_local());
    }
}
