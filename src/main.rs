//! Telemetry forwarder command line
//!
//! Reads one request as JSON from a file or stdin and forwards it to the
//! configured telemetry service.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use telemetry_forwarder::core::ForwarderSettings;
use telemetry_forwarder::{IncomingRequest, TelemetryForwarder};

#[derive(Parser, Debug)]
#[command(
    name = "telemetry-forwarder",
    about = "Forward a telemetry request to the telemetry service",
    version
)]
struct Args {
    /// JSON request file; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Properties file holding the telemetry API path
    #[arg(long)]
    properties: Option<PathBuf>,

    /// Exit with an error when delivery fails
    #[arg(long)]
    strict: bool,

    /// Print the resolved URL and payload without sending
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .init();
    }

    let mut settings = ForwarderSettings::from_env()?;
    if let Some(path) = args.properties.clone() {
        settings.properties_file = Some(path);
    }

    let raw = read_input(args.input.as_ref()).await?;
    let request = parse_request(&raw)?;
    let forwarder = TelemetryForwarder::from_settings(&settings)?;

    if args.dry_run {
        println!("{}", forwarder.telemetry_url());
        if let Some(request) = &request {
            println!("{}", forwarder.telemetry_request(request).to_json()?);
        }
        return Ok(());
    }

    if args.strict {
        match forwarder.try_forward(request.as_ref()).await {
            Ok(Some(report)) => {
                info!("Telemetry delivered with status {}", report.status);
                Ok(())
            }
            Ok(None) => {
                info!("No request supplied, nothing sent");
                Ok(())
            }
            Err(e) => {
                let origin = if e.is_local() { "before sending" } else { "in transit" };
                error!("Telemetry delivery failed {}: {}", origin, e);
                Err(e.into())
            }
        }
    } else {
        forwarder.forward(request.as_ref()).await;
        Ok(())
    }
}

async fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

/// Empty input or a JSON `null` means there is no request
fn parse_request(raw: &str) -> Result<Option<IncomingRequest>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let request = IncomingRequest::from_json_str(trimmed).context("Invalid request JSON")?;
    Ok(Some(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_absent() {
        assert!(parse_request("").unwrap().is_none());
        assert!(parse_request("  null\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_request_present() {
        let request = parse_request(r#"{"request":{"ets":1}}"#).unwrap().unwrap();
        assert_eq!(request.get("ets"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn test_parse_request_invalid() {
        assert!(parse_request("{oops").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["telemetry-forwarder", "--input", "req.json", "--strict"]);
        assert_eq!(args.input, Some(PathBuf::from("req.json")));
        assert!(args.strict);
        assert!(!args.dry_run);
    }
}
