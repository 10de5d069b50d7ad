//! Configuration management for the telemetry forwarder
//!
//! Values come from two places: the process environment and a cached
//! properties file. The telemetry base URL is looked up in the environment
//! first and falls back to the properties cache; the API path is read from
//! the properties cache only.

use super::properties::PropertiesCache;
use super::{TelemetryError, TelemetryResult};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Key holding the telemetry service base URL
pub const TELEMETRY_BASE_URL_KEY: &str = "sunbird_telemetry_base_url";

/// Key holding the telemetry API path appended to the base URL
pub const TELEMETRY_API_PATH_KEY: &str = "sunbird_telemetry_api_path";

/// Environment variable naming the properties file to load
pub const PROPERTIES_FILE_ENV: &str = "TELEMETRY_PROPERTIES_FILE";

/// Environment variable for an optional HTTP client timeout
pub const HTTP_TIMEOUT_ENV: &str = "TELEMETRY_HTTP_TIMEOUT_SECS";

/// Properties file used when nothing else is configured
pub const DEFAULT_PROPERTIES_FILE: &str = "telemetry.properties";

/// A read-only source of string configuration values
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment lookup; blank values count as absent
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed in-memory values, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource(HashMap<String, String>);

impl StaticSource {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl ConfigSource for StaticSource {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Resolves configuration keys against the environment and the properties cache
#[derive(Clone)]
pub struct ConfigResolver {
    env: Arc<dyn ConfigSource>,
    properties: Arc<PropertiesCache>,
}

impl ConfigResolver {
    pub fn new(env: Arc<dyn ConfigSource>, properties: Arc<PropertiesCache>) -> Self {
        Self { env, properties }
    }

    /// Resolver over the real process environment
    pub fn from_env(properties: Arc<PropertiesCache>) -> Self {
        Self::new(Arc::new(EnvSource), properties)
    }

    /// Environment value, falling back to the properties cache
    pub fn config_value(&self, key: &str) -> Option<String> {
        self.env.get(key).or_else(|| self.properties.get(key))
    }

    /// Properties cache value only
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &PropertiesCache {
        &self.properties
    }
}

/// Forwarder settings that are not resolved per call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwarderSettings {
    /// Properties file backing the properties cache
    pub properties_file: Option<PathBuf>,
    /// Client-wide HTTP timeout; `None` keeps the client default
    pub http_timeout: Option<Duration>,
}

impl ForwarderSettings {
    /// Load settings from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `TELEMETRY_PROPERTIES_FILE`: properties file path (optional)
    /// - `TELEMETRY_HTTP_TIMEOUT_SECS`: positive integer timeout (optional)
    pub fn from_env() -> TelemetryResult<Self> {
        Self::from_source(&EnvSource)
    }

    /// Load settings from any configuration source
    pub fn from_source(source: &dyn ConfigSource) -> TelemetryResult<Self> {
        let properties_file = source.get(PROPERTIES_FILE_ENV).map(PathBuf::from);
        info!("Properties file from env: {:?}", properties_file);

        let http_timeout = match source.get(HTTP_TIMEOUT_ENV) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    TelemetryError::config(format!(
                        "{} must be a positive integer, got '{}'",
                        HTTP_TIMEOUT_ENV, raw
                    ))
                })?;
                if secs == 0 {
                    return Err(TelemetryError::config(format!(
                        "{} must be greater than zero",
                        HTTP_TIMEOUT_ENV
                    )));
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };
        info!("HTTP timeout from env: {:?}", http_timeout);

        Ok(Self {
            properties_file,
            http_timeout,
        })
    }

    /// Properties file to load, defaulting to `telemetry.properties`
    pub fn properties_path(&self) -> PathBuf {
        self.properties_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROPERTIES_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(env: &[(&str, &str)], props: &[(&str, &str)]) -> ConfigResolver {
        ConfigResolver::new(
            Arc::new(StaticSource::new(env.iter().copied())),
            Arc::new(PropertiesCache::from_pairs(props.iter().copied())),
        )
    }

    #[test]
    fn test_config_value_prefers_env() {
        let r = resolver(
            &[(TELEMETRY_BASE_URL_KEY, "http://env-host")],
            &[(TELEMETRY_BASE_URL_KEY, "http://props-host")],
        );
        assert_eq!(
            r.config_value(TELEMETRY_BASE_URL_KEY).as_deref(),
            Some("http://env-host")
        );
    }

    #[test]
    fn test_config_value_falls_back_to_properties() {
        let r = resolver(&[], &[(TELEMETRY_BASE_URL_KEY, "http://props-host")]);
        assert_eq!(
            r.config_value(TELEMETRY_BASE_URL_KEY).as_deref(),
            Some("http://props-host")
        );
    }

    #[test]
    fn test_property_ignores_env() {
        let r = resolver(&[(TELEMETRY_API_PATH_KEY, "/from-env")], &[]);
        assert_eq!(r.property(TELEMETRY_API_PATH_KEY), None);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ForwarderSettings::from_source(&StaticSource::default()).unwrap();
        assert_eq!(settings, ForwarderSettings::default());
        assert_eq!(
            settings.properties_path(),
            PathBuf::from(DEFAULT_PROPERTIES_FILE)
        );
    }

    #[test]
    fn test_settings_timeout() {
        let source = StaticSource::new([
            (HTTP_TIMEOUT_ENV, "15"),
            (PROPERTIES_FILE_ENV, "/etc/telemetry.properties"),
        ]);
        let settings = ForwarderSettings::from_source(&source).unwrap();
        assert_eq!(settings.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(
            settings.properties_path(),
            PathBuf::from("/etc/telemetry.properties")
        );
    }

    #[test]
    fn test_settings_rejects_bad_timeout() {
        for raw in ["abc", "0", "-3"] {
            let source = StaticSource::new([(HTTP_TIMEOUT_ENV, raw)]);
            let result = ForwarderSettings::from_source(&source);
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains(HTTP_TIMEOUT_ENV));
        }
    }
}
