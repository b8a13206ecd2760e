//! Configuration schema and loader for recordbase clients.
//!
//! [`ClientConfig`] is the explicit, named-field form of everything a
//! connection needs. It is validated when a connection is made, not while
//! it is being assembled. Endpoint and token strings are resolved by
//! [`resolve::Resolver`].

pub mod resolve;

pub use resolve::{
    Resolver, Target, DEFAULT_TLS_PORT, ENV_PREFIX, LEGACY_ENV_PREFIX, TLS_PREFIX,
};

use serde::{Deserialize, Serialize};

/// Connection and per-call settings for a recordbase client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Store address, e.g. `127.0.0.1:8500` or `tls://db.example.com:8500`.
    pub endpoint: String,

    /// Auth token, or `$VAR` / `env:VAR` to read it from the environment.
    #[serde(default)]
    pub token: String,

    /// Use TLS even without the `tls://` prefix.
    #[serde(default)]
    pub tls: bool,

    /// Connect timeout in milliseconds (0 = unbounded).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: i64,

    /// Per-request timeout in milliseconds (0 = unbounded).
    #[serde(default)]
    pub request_timeout_ms: i64,

    /// Fetch file contents on get.
    #[serde(default)]
    pub include_file_contents: bool,
}

impl ClientConfig {
    /// Config for `endpoint` with every other field at its default.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: String::new(),
            tls: false,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: 0,
            include_file_contents: false,
        }
    }

    /// Validate that configuration values are usable for a connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.endpoint.trim() == TLS_PREFIX {
            return Err(ConfigError::Invalid(format!(
                "endpoint has no address after {}",
                TLS_PREFIX
            )));
        }
        Ok(())
    }

    /// Resolve endpoint and token with the default prefixes.
    pub fn target(&self) -> Target {
        Resolver::default().resolve(&self.endpoint, &self.token, self.tls)
    }
}

fn default_connect_timeout_ms() -> i64 {
    5000
}

// --- Loading ---

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load a `ClientConfig` from a YAML file path.
pub fn load_from_file(path: &std::path::Path) -> Result<ClientConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

/// Load a `ClientConfig` from a YAML string.
pub fn load_from_str(yaml: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}
