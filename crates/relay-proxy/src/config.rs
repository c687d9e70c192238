//! Configuration types and loading logic.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use relay_tracing::TracingConfig;
use serde::Deserialize;

/// Environment variable holding the cross-origin allow-list.
pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";

/// Top-level proxy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// Outbound leg settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    /// Hard limit for the whole outbound round trip, body included.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Largest inbound body the relay will buffer.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Cross-origin policy for the transport layer. The forwarding pipeline
/// never looks at this.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of exact origins.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

/// Parsed form of [`CorsConfig::allowed_origins`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

fn default_listen_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl AllowedOrigins {
    /// `*` (or nothing at all) allows every origin; anything else is split
    /// on commas and trimmed. A `*` entry inside a list also means any.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return AllowedOrigins::Any;
        }
        let list: Vec<String> = raw
            .split(',')
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if list.is_empty() || list.iter().any(|o| o == "*") {
            return AllowedOrigins::Any;
        }
        AllowedOrigins::List(list)
    }
}

impl CorsConfig {
    pub fn origins(&self) -> AllowedOrigins {
        AllowedOrigins::parse(&self.allowed_origins)
    }
}

impl ProxyConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. `ALLOWED_ORIGINS` for the CORS allow-list
    /// 2. Environment variables (RELAY_ prefix, __ for nesting)
    /// 3. TOML config file (optional)
    /// 4. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let mut config: ProxyConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("RELAY_").split("__"))
            .extract()?;

        if let Ok(origins) = std::env::var(ALLOWED_ORIGINS_ENV) {
            config.cors.allowed_origins = origins;
        }

        Ok(config)
    }
}
