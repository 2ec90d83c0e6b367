//! Client configuration
//!
//! Connection-wide settings: where the API lives, transport resilience knobs,
//! and the validation/pagination policies the engine consults.

use crate::http::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Backoff strategy for transport retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

/// Configuration for a [`Connection`](crate::connection::Connection)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host serving the API, scheme included (e.g. `https://api.example.org`)
    pub host: String,
    /// Explicit port, appended to the host when set
    pub port: Option<u16>,
    /// API version path segment (e.g. `v3`)
    pub api_version: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of transport retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimitConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// Client-identity header value
    pub user_agent: String,
    /// Page size requested automatically once iteration proceeds past the
    /// first page
    pub bulk_page_size: u64,
    /// Reject parameters that are absent from the discovery schema instead of
    /// passing them through
    pub strict_validation: bool,
    /// Cache GET responses in memory
    pub cache_responses: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            api_version: "v3".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimitConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("pagestream/{}", env!("CARGO_PKG_VERSION")),
            bulk_page_size: 1000,
            strict_validation: false,
            cache_responses: true,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Versioned base URL, e.g. `https://api.example.org:443/v3`
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        match self.port {
            Some(port) => format!("{host}:{port}/{}", self.api_version),
            None => format!("{host}/{}", self.api_version),
        }
    }

    /// Full URL for an endpoint path under the versioned base
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url())
    }

    /// Major version component the client expects from the remote server,
    /// derived from the configured version segment (`v3` -> `3`)
    pub fn expected_major_version(&self) -> &str {
        self.api_version.trim_start_matches('v')
    }
}

/// Builder for [`ClientConfig`]
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the host (scheme included)
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set an explicit port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    /// Set the API version path segment
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the client-identity header value
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the bulk page size used on continuation requests
    pub fn bulk_page_size(mut self, size: u64) -> Self {
        self.config.bulk_page_size = size;
        self
    }

    /// Fail validation for parameters absent from the discovery schema
    pub fn strict_validation(mut self, strict: bool) -> Self {
        self.config.strict_validation = strict;
        self
    }

    /// Enable or disable the in-memory response cache
    pub fn cache_responses(mut self, enabled: bool) -> Self {
        self.config.cache_responses = enabled;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
