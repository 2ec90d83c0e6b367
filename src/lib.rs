// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]

//! # pagestream
//!
//! An async client for paginated, filterable REST search APIs.
//!
//! The crate hides the request/response shape of the remote API behind two
//! abstractions: a [`Connection`](connection::Connection) that dispatches
//! individual queries (with retries, rate limiting, and response caching),
//! and a [`SearchResults`](results::SearchResults) engine that presents every
//! record matching a query as one lazy sequence, paginating behind the
//! scenes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagestream::{ClientConfig, Connection, Params, ParamValue, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder()
//!         .host("https://api.example.org")
//!         .build();
//!     let conn = Connection::connect(config).await?;
//!
//!     let mut params = Params::new();
//!     params.insert("q".to_string(), ParamValue::from("asthma"));
//!
//!     let mut results = conn.search("/public/search");
//!     results.invoke(params).await?;
//!     println!("{results}");
//!
//!     while let Some(record) = results.next_record().await? {
//!         // Process records
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      SearchResults                        │
//! │  invoke(params)   filter(params)   next_record() → record │
//! └───────────────────────────┬───────────────────────────────┘
//!                             │
//! ┌───────────┬───────────┬───┴──────┬────────────┬───────────┐
//! │  Schema   │ Dispatch  │ Envelope │ Transport  │  Export   │
//! ├───────────┼───────────┼──────────┼────────────┼───────────┤
//! │ Discovery │ GET/POST  │ Paged    │ Retry      │ NDJSON    │
//! │ Validation│ Canonical │ Single   │ Rate Limit │ CSV       │
//! │ Docs      │ ordering  │ Raw      │ Cache      │ Parquet   │
//! └───────────┴───────────┴──────────┴────────────┴───────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// HTTP transport with retry, rate limiting, and response caching
pub mod http;

/// Response envelope parsing
pub mod envelope;

/// Schema discovery and parameter validation
pub mod schema;

/// Connection and query dispatch
pub mod connection;

/// Result iteration engine
pub mod results;

/// Record export to NDJSON, CSV, and Parquet
pub mod export;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{BackoffType, ClientConfig};
pub use connection::{Connection, Health};
pub use envelope::{Envelope, Meta};
pub use error::{Error, Result};
pub use results::{EngineState, SearchResults};
pub use schema::{ApiSchema, ParamType};
pub use types::{JsonObject, JsonValue, Method, ParamValue, Params};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
