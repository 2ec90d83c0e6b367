//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated search API client CLI
#[derive(Parser, Debug)]
#[command(name = "pagestream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API host (scheme and authority)
    #[arg(short = 'H', long, global = true, default_value = "https://api.example.org")]
    pub host: String,

    /// API version prefix
    #[arg(long, global = true, default_value = "v3")]
    pub api_version: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout: u64,

    /// Reject parameters the discovery document does not declare
    #[arg(long, global = true)]
    pub strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Health check against the remote API
    Ping,

    /// Show the client and remote API versions
    Version,

    /// List available endpoint paths
    Endpoints,

    /// Show documentation for one endpoint
    Docs {
        /// Endpoint path, e.g. /public/search
        endpoint: String,
    },

    /// Run a query and stream every matching record
    Search {
        /// Endpoint path, e.g. /public/search
        endpoint: String,

        /// Query filter as name=value (repeatable; comma-separated values
        /// form a list)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Use POST instead of GET
        #[arg(long)]
        post: bool,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<u64>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        format: OutputFormat,

        /// Gzip-compress the output file (ndjson only)
        #[arg(long)]
        gzip: bool,
    },
}

/// Output format for the search command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON record per line
    Ndjson,
    /// A single JSON array
    Json,
    /// CSV with flattened columns
    Csv,
    /// Parquet with flattened columns
    Parquet,
}
