//! HTTP executor
//!
//! Performs the actual GET/POST calls for the dispatcher:
//! - Automatic retries on 5xx/429 with configurable backoff
//! - Token bucket rate limiting
//! - In-memory caching of GET bodies, with a per-request bypass used by
//!   paginated continuation requests
//!
//! The executor returns raw body text; envelope normalization happens one
//! layer up and is deliberately lenient about response shapes.

use super::cache::ResponseCache;
use super::rate_limit::RateLimiter;
use crate::config::{BackoffType, ClientConfig};
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// A single request handed to the executor
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET or POST, enforced upstream)
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Query pairs in canonical (sorted) order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// JSON body for POST requests
    pub body: Option<JsonValue>,
    /// Skip the response cache for this request
    pub bypass_cache: bool,
}

impl HttpRequest {
    /// Create a GET request for a URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
            bypass_cache: false,
        }
    }

    /// Create a POST request with a JSON body
    pub fn post(url: impl Into<String>, body: JsonValue) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: Some(body),
            bypass_cache: false,
        }
    }

    /// Set the query pairs (must already be canonically ordered)
    #[must_use]
    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Skip the response cache
    #[must_use]
    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }
}

/// HTTP executor with retry, rate limiting, and response caching
pub struct HttpExecutor {
    client: Client,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    backoff_type: BackoffType,
    default_headers: HashMap<String, String>,
    user_agent: String,
    rate_limiter: Option<RateLimiter>,
    cache: Option<ResponseCache>,
}

impl HttpExecutor {
    /// Create an executor from a client config
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout,
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            backoff_type: config.backoff_type,
            default_headers: config.default_headers.clone(),
            user_agent: config.user_agent.clone(),
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            cache: config.cache_responses.then(ResponseCache::new),
        })
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Number of cached response bodies
    pub fn cached_responses(&self) -> usize {
        self.cache.as_ref().map_or(0, ResponseCache::len)
    }

    /// Execute a request and return the response body text.
    ///
    /// GET bodies are served from and stored into the cache unless the
    /// request asks for a bypass. Transport failures surface unchanged after
    /// retries are exhausted.
    pub async fn execute(&self, request: &HttpRequest) -> Result<String> {
        let cache_key = ResponseCache::key(
            request.method.as_str(),
            &request.url,
            &request.query,
        );

        if request.method == Method::Get && !request.bypass_cache {
            if let Some(body) = self.cache.as_ref().and_then(|c| c.get(&cache_key)) {
                debug!("cache hit: GET {}", request.url);
                return Ok(body);
            }
        }

        let response = self.send_with_retries(request).await?;
        let body = response.text().await.map_err(Error::Http)?;

        if request.method == Method::Get && !request.bypass_cache {
            if let Some(cache) = &self.cache {
                cache.put(cache_key, body.clone());
            }
        }

        Ok(body)
    }

    /// Retry loop around a single logical request
    async fn send_with_retries(&self, request: &HttpRequest) -> Result<Response> {
        let mut last_error = None;
        let mut attempt = 0;

        while attempt <= self.max_retries {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self
                .client
                .request(request.method.into(), &request.url)
                .header("User-Agent", &self.user_agent);

            for (key, value) in &self.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }
            for (key, value) in &request.headers {
                req = req.header(key.as_str(), value.as_str());
            }

            if !request.query.is_empty() {
                req = req.query(&request.query);
            }
            if let Some(ref body) = request.body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = extract_retry_after(&response);
                        if attempt < self.max_retries {
                            warn!(
                                "Rate limited (429), attempt {}/{}, waiting {}s",
                                attempt + 1,
                                self.max_retries + 1,
                                retry_after
                            );
                            tokio::time::sleep(Duration::from_secs(retry_after)).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: retry_after,
                        });
                    }

                    if is_retryable_status(status) && attempt < self.max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::HttpStatus {
                            status: status.as_u16(),
                            body: String::new(),
                        });
                        continue;
                    }

                    if status.is_client_error() || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::HttpStatus {
                            status: status.as_u16(),
                            body,
                        });
                    }

                    debug!("Request succeeded: {} {}", request.method, request.url);
                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        if attempt < self.max_retries {
                            let delay = self.calculate_backoff(attempt);
                            warn!(
                                "Request timeout, attempt {}/{}, retrying in {:?}",
                                attempt + 1,
                                self.max_retries + 1,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                            last_error = Some(Error::Timeout {
                                timeout_ms: self.timeout.as_millis() as u64,
                            });
                            continue;
                        }
                        return Err(Error::Timeout {
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }

                    if e.is_connect() && attempt < self.max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Connection error, attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::Http(e));
                        continue;
                    }

                    return Err(Error::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded {
            max_retries: self.max_retries,
        }))
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .field("has_cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

/// Check if an HTTP status is retryable
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(60)
}
