//! Core module containing configuration and error handling
//!
//! This module provides the building blocks shared by the forwarder,
//! the transport and the command line entry point.

pub mod config;
pub mod errors;
pub mod properties;

// Re-export for convenience
pub use config::{ConfigResolver, ConfigSource, EnvSource, ForwarderSettings, StaticSource};
pub use errors::{TelemetryError, TelemetryResult};
pub use properties::PropertiesCache;
