//! Configuration types
//!
//! [`ProviderConfig`] configures the API client; [`MxRecordConfig`] is the
//! user-facing shape of an MX record resource.

use serde::{Deserialize, Serialize};
use std::env;

use crate::schema::ResourceData;

/// Default Njalla JSON-RPC endpoint
pub const DEFAULT_ENDPOINT: &str = "https://njal.la/api/1/";

/// Default HTTP timeout for API requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the API token
pub const ENV_API_TOKEN: &str = "NJALLA_API_TOKEN";

/// Environment variable overriding the API endpoint
pub const ENV_API_ENDPOINT: &str = "NJALLA_API_ENDPOINT";

/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_SECS: &str = "NJALLA_TIMEOUT_SECS";

/// API client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Njalla API token
    pub api_token: String,

    /// JSON-RPC endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// The token must never reach logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a configuration with the default endpoint and timeout
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Load configuration from `NJALLA_*` environment variables
    pub fn from_env() -> Result<Self, crate::Error> {
        let api_token = env::var(ENV_API_TOKEN)
            .map_err(|_| crate::Error::config(format!("{ENV_API_TOKEN} is not set")))?;

        let mut config = Self::new(api_token);

        if let Ok(endpoint) = env::var(ENV_API_ENDPOINT) {
            config.endpoint = endpoint;
        }

        if let Ok(timeout) = env::var(ENV_TIMEOUT_SECS) {
            config.timeout_secs = timeout.parse().map_err(|_| {
                crate::Error::config(format!(
                    "{ENV_TIMEOUT_SECS} must be a number of seconds, got {timeout:?}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config("Njalla API token cannot be empty"));
        }

        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Njalla endpoint must use HTTP or HTTPS scheme. Got: {}",
                self.endpoint
            )));
        }

        if !(1..=600).contains(&self.timeout_secs) {
            return Err(crate::Error::config(format!(
                "Timeout must be between 1 and 600 seconds. Got: {}",
                self.timeout_secs
            )));
        }

        Ok(())
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// MX record resource configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxRecordConfig {
    /// Parent zone
    pub domain: String,

    /// Subdomain label
    #[serde(default = "default_name")]
    pub name: String,

    /// Time-to-live in seconds
    pub ttl: i64,

    /// Mail exchanger preference
    pub priority: i64,

    /// Mail exchanger hostname
    pub content: String,
}

impl MxRecordConfig {
    /// Create a record configuration at the zone apex
    pub fn new(domain: impl Into<String>, ttl: i64, priority: i64, content: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: default_name(),
            ttl,
            priority,
            content: content.into(),
        }
    }

    /// Set the subdomain label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl From<&MxRecordConfig> for ResourceData {
    fn from(config: &MxRecordConfig) -> Self {
        ResourceData::new()
            .with("domain", config.domain.as_str())
            .with("name", config.name.as_str())
            .with("ttl", config.ttl)
            .with("priority", config.priority)
            .with("content", config.content.as_str())
    }
}

fn default_name() -> String {
    "@".to_string()
}
