//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::export;
use crate::types::{JsonValue, Method, ParamValue, Params};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Ping => self.ping().await,
            Commands::Version => self.version().await,
            Commands::Endpoints => self.endpoints().await,
            Commands::Docs { endpoint } => self.docs(endpoint).await,
            Commands::Search {
                endpoint,
                filters,
                post,
                limit,
                output,
                format,
                gzip,
            } => {
                self.search(
                    endpoint,
                    filters,
                    *post,
                    *limit,
                    output.as_deref(),
                    *format,
                    *gzip,
                )
                .await
            }
        }
    }

    /// Build the connection config from the global flags
    fn config(&self) -> ClientConfig {
        ClientConfig::builder()
            .host(&self.cli.host)
            .api_version(&self.cli.api_version)
            .timeout(Duration::from_secs(self.cli.timeout))
            .strict_validation(self.cli.strict)
            .build()
    }

    async fn connect(&self) -> Result<Connection> {
        Connection::connect(self.config()).await
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.connect().await?;
        let health = conn.ping().await?;
        if health.healthy {
            println!("ok");
            Ok(())
        } else {
            Err(Error::Other(format!(
                "unhealthy: {}",
                health.message.unwrap_or_else(|| "no payload".to_string())
            )))
        }
    }

    async fn version(&self) -> Result<()> {
        let conn = self.connect().await?;
        let remote = conn.remote_version().await?;
        println!("client: {}", crate::VERSION);
        println!("remote: {remote}");
        Ok(())
    }

    async fn endpoints(&self) -> Result<()> {
        let conn = self.connect().await?;
        for endpoint in conn.endpoints() {
            println!("{endpoint}");
        }
        Ok(())
    }

    async fn docs(&self, endpoint: &str) -> Result<()> {
        let conn = self.connect().await?;
        let docs = conn.endpoint_docs(endpoint)?;
        println!("{}", serde_json::to_string_pretty(docs)?);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn search(
        &self,
        endpoint: &str,
        filters: &[String],
        post: bool,
        limit: Option<u64>,
        output: Option<&Path>,
        format: OutputFormat,
        gzip: bool,
    ) -> Result<()> {
        if gzip && (output.is_none() || format != OutputFormat::Ndjson) {
            return Err(Error::export(
                "--gzip requires --output and the ndjson format",
            ));
        }

        let conn = self.connect().await?;
        let method = if post { Method::Post } else { Method::Get };
        let mut results = conn.search_with_method(endpoint, method);
        results.invoke(parse_filters(filters)?).await?;

        eprintln!("{results}");

        let records = match limit {
            Some(limit) => results.slice(0, Some(limit), 1).await?,
            None => results.collect_remaining().await?,
        };

        match output {
            Some(path) => write_file(&records, path, format, gzip),
            None => write_stdout(&records, format),
        }
    }
}

/// Parse `name=value` filter arguments into typed parameters.
///
/// Values parse as booleans or numbers when they look like one, and
/// comma-separated values become lists.
fn parse_filters(filters: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for filter in filters {
        let (name, value) = filter
            .split_once('=')
            .ok_or_else(|| Error::config(format!("filter '{filter}' is not name=value")))?;
        params.insert(name.to_string(), parse_value(value));
    }
    Ok(params)
}

fn parse_value(value: &str) -> ParamValue {
    if value.contains(',') {
        return ParamValue::List(value.split(',').map(parse_scalar).collect());
    }
    parse_scalar(value)
}

fn parse_scalar(value: &str) -> ParamValue {
    if let Ok(b) = value.parse::<bool>() {
        return ParamValue::Bool(b);
    }
    if let Ok(i) = value.parse::<i64>() {
        return ParamValue::Int(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return ParamValue::Float(f);
    }
    ParamValue::from(value)
}

fn write_stdout(records: &[JsonValue], format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    match format {
        OutputFormat::Ndjson => {
            export::write_ndjson(records, stdout.lock())?;
        }
        OutputFormat::Json => {
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, records)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            export::write_csv(records, stdout.lock())?;
        }
        OutputFormat::Parquet => {
            return Err(Error::export(
                "parquet output requires a file path (use --output)",
            ));
        }
    }
    Ok(())
}

fn write_file(records: &[JsonValue], path: &Path, format: OutputFormat, gzip: bool) -> Result<()> {
    let written = match format {
        OutputFormat::Ndjson => export::write_ndjson_file(records, path, gzip)?,
        OutputFormat::Json => {
            let file = std::fs::File::create(path)?;
            serde_json::to_writer_pretty(file, records)?;
            records.len()
        }
        OutputFormat::Csv => export::write_csv_file(records, path)?,
        OutputFormat::Parquet => export::write_parquet_file(records, path, None)?,
    };
    eprintln!("wrote {written} records to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        let params = parse_filters(&[
            "q=asthma".to_string(),
            "size=25".to_string(),
            "direct=true".to_string(),
            "score=0.5".to_string(),
            "target=a,b,c".to_string(),
        ])
        .unwrap();

        assert_eq!(params.get("q"), Some(&ParamValue::from("asthma")));
        assert_eq!(params.get("size"), Some(&ParamValue::Int(25)));
        assert_eq!(params.get("direct"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("score"), Some(&ParamValue::Float(0.5)));
        assert_eq!(
            params.get("target"),
            Some(&ParamValue::from(vec!["a", "b", "c"]))
        );
    }

    #[test]
    fn test_parse_filters_rejects_bare_name() {
        assert!(parse_filters(&["nonsense".to_string()]).is_err());
    }
}
