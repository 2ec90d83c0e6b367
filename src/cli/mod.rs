//! CLI module
//!
//! Command-line interface for querying the search API.
//!
//! # Commands
//!
//! - `ping` - Health check against the remote API
//! - `version` - Show the client and remote API versions
//! - `endpoints` - List available endpoint paths
//! - `docs` - Show documentation for one endpoint
//! - `search` - Run a query and stream every matching record

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
