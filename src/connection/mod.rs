//! Connection to the remote search API
//!
//! Owns the HTTP executor and the validation schema, and implements the query
//! dispatcher: GET/POST selection, canonical parameter ordering, and the
//! client-identity header. One connection serves any number of iteration
//! engines; each engine borrows it immutably.

use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpExecutor, HttpRequest};
use crate::results::SearchResults;
use crate::schema::ApiSchema;
use crate::types::{JsonValue, Method, ParamValue, Params};
use tracing::{debug, warn};


/// Discovery document location under the versioned base URL
const DISCOVERY_ENDPOINT: &str = "/platform/swagger";
/// Version endpoint, checked once at connect time
const VERSION_ENDPOINT: &str = "/platform/public/utils/version";
/// Health check endpoint
const PING_ENDPOINT: &str = "/platform/public/utils/ping";
/// Canonical health check payload
const PONG: &str = "pong";

/// A GET auto-upgrades to POST when any list parameter exceeds this many
/// elements, to keep query strings bounded
const POST_UPGRADE_LIST_LEN: usize = 3;

/// Result of a health check.
///
/// `healthy` is true only for the canonical payload; any other payload is
/// preserved verbatim in `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub healthy: bool,
    pub message: Option<String>,
}

/// Handle for a connection to the search API
#[derive(Debug)]
pub struct Connection {
    config: ClientConfig,
    executor: HttpExecutor,
    schema: ApiSchema,
}

impl Connection {
    /// Open a connection: build the transport, fetch the discovery document,
    /// and check the remote version (a mismatch warns, never aborts).
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        // Reject malformed hosts before any request goes out
        let base = url::Url::parse(&config.base_url())?;
        let executor = HttpExecutor::new(&config)?;

        let doc = executor
            .execute(&HttpRequest::get(format!("{base}{DISCOVERY_ENDPOINT}")))
            .await
            .context("failed to fetch the discovery document")?;
        let schema = ApiSchema::from_yaml(&doc, config.strict_validation)?;

        let connection = Self {
            config,
            executor,
            schema,
        };
        connection.check_remote_version().await;
        Ok(connection)
    }

    /// API version reported by the remote server
    pub async fn remote_version(&self) -> Result<String> {
        let envelope = self.get(VERSION_ENDPOINT, &Params::new()).await?;
        envelope.scalar_text().ok_or_else(|| {
            Error::Other("version endpoint returned a non-scalar payload".to_string())
        })
    }

    /// Compare the remote major version against the configured one
    async fn check_remote_version(&self) {
        match self.remote_version().await {
            Ok(remote) => {
                let expected = self.config.expected_major_version();
                if !remote.starts_with(expected) {
                    warn!(
                        "The remote server is running API version {remote}, but the client \
                         expected major version {expected}. They may not be compatible."
                    );
                }
            }
            Err(e) => warn!("Version check failed: {e}"),
        }
    }

    /// Dispatch a query and return the parsed envelope.
    ///
    /// Upgrades GET to POST for oversized list parameters, serializes
    /// parameters in canonical (sorted) order so identical logical queries
    /// share a cache key, and bypasses the response cache when the `no_cache`
    /// parameter is set.
    pub async fn dispatch(
        &self,
        endpoint: &str,
        method: Method,
        params: &Params,
    ) -> Result<Envelope> {
        let method = if method == Method::Get && needs_post(params) {
            debug!("switching to POST due to large list parameter");
            Method::Post
        } else {
            method
        };

        let url = self.config.endpoint_url(endpoint);
        let bypass_cache = matches!(params.get("no_cache"), Some(ParamValue::Bool(true)));

        let request = match method {
            Method::Get => {
                // BTreeMap iteration is sorted by key, which is the
                // canonical order
                let query: Vec<(String, String)> = params
                    .iter()
                    .flat_map(|(key, value)| value.query_pairs(key))
                    .collect();
                HttpRequest::get(url).query(query)
            }
            Method::Post => {
                let body: JsonValue = params
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<serde_json::Map<_, _>>()
                    .into();
                HttpRequest::post(url, body)
            }
        };

        let body = self
            .executor
            .execute(&request.bypass_cache(bypass_cache))
            .await?;
        Ok(Envelope::parse(&body))
    }

    /// Make a GET request (may auto-upgrade to POST)
    pub async fn get(&self, endpoint: &str, params: &Params) -> Result<Envelope> {
        self.dispatch(endpoint, Method::Get, params).await
    }

    /// Make a POST request
    pub async fn post(&self, endpoint: &str, params: &Params) -> Result<Envelope> {
        self.dispatch(endpoint, Method::Post, params).await
    }

    /// Health check against the ping endpoint
    pub async fn ping(&self) -> Result<Health> {
        let envelope = self.get(PING_ENDPOINT, &Params::new()).await?;
        let payload = envelope.scalar_text();
        Ok(match payload {
            Some(ref text) if text == PONG => Health {
                healthy: true,
                message: None,
            },
            other => Health {
                healthy: false,
                message: other,
            },
        })
    }

    /// Create an iteration engine bound to this connection and an endpoint
    pub fn search(&self, endpoint: impl Into<String>) -> SearchResults<'_> {
        SearchResults::new(self, endpoint, Method::Get)
    }

    /// Create an iteration engine with an explicit HTTP method
    pub fn search_with_method(
        &self,
        endpoint: impl Into<String>,
        method: Method,
    ) -> SearchResults<'_> {
        SearchResults::new(self, endpoint, method)
    }

    /// Available endpoint paths from the discovery document
    pub fn endpoints(&self) -> Vec<String> {
        self.schema.endpoints()
    }

    /// Documentation for one endpoint path
    pub fn endpoint_docs(&self, endpoint: &str) -> Result<&JsonValue> {
        self.schema.endpoint_docs(endpoint)
    }

    /// The validation schema fetched at connect time
    pub fn schema(&self) -> &ApiSchema {
        &self.schema
    }

    /// Connection configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// True when any parameter value is a list longer than the upgrade threshold
fn needs_post(params: &Params) -> bool {
    params
        .values()
        .any(|value| matches!(value, ParamValue::List(items) if items.len() > POST_UPGRADE_LIST_LEN))
}
