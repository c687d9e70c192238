//! Tracing configuration types.

use serde::Deserialize;

/// Logging and span export settings, read from the `[tracing]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// Service name attached to exported spans.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// gRPC OTLP collector, e.g. "http://localhost:4317". Unset means logs only.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// `EnvFilter` directives, e.g. "relay_proxy=debug,info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

/// Shape of the lines written to stderr.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single lines.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

fn default_service_name() -> String {
    "relay-proxy".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            otlp_endpoint: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}
