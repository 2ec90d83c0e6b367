//! Record export
//!
//! Turns the JSON records yielded by an iteration engine into files:
//! newline-delimited JSON (optionally gzip-compressed), CSV, or Parquet.
//! Tabular formats go through a
//! flatten step first (nested objects become dot-separated columns) and CSV
//! additionally compresses list values into pipe-joined strings so every
//! cell is a scalar.

use crate::error::Result;
use crate::types::{JsonObject, JsonValue};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

mod batch;
mod writer;

#[cfg(test)]
mod tests;

pub use batch::{infer_schema, json_to_arrow, merge_schemas};
pub use writer::{write_parquet, ParquetOptions};

/// Separator between nested keys in flattened records
pub const FLATTEN_SEPARATOR: &str = ".";
/// Separator joining list elements in compressed cells
pub const LIST_SEPARATOR: &str = "|";

/// Flatten a record into a single-level object with dot-separated keys.
///
/// Only nested objects are flattened; arrays and scalars pass through
/// unchanged. Non-object records come back as a single `value` column.
pub fn flatten(record: &JsonValue) -> JsonObject {
    let mut flat = JsonObject::new();
    match record {
        JsonValue::Object(obj) => flatten_into(obj, "", &mut flat),
        other => {
            flat.insert("value".to_string(), other.clone());
        }
    }
    flat
}

fn flatten_into(obj: &JsonObject, prefix: &str, out: &mut JsonObject) {
    for (key, value) in obj {
        let flat_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{FLATTEN_SEPARATOR}{key}")
        };
        match value {
            JsonValue::Object(nested) => flatten_into(nested, &flat_key, out),
            other => {
                out.insert(flat_key, other.clone());
            }
        }
    }
}

/// Replace every list value with a pipe-joined string.
///
/// Scalar elements render with their natural text form; anything nested is
/// serialized as JSON so no information is lost.
pub fn compress_lists(mut record: JsonObject) -> JsonObject {
    for value in record.values_mut() {
        if let JsonValue::Array(items) = value {
            let joined = items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => s.clone(),
                    scalar @ (JsonValue::Number(_) | JsonValue::Bool(_)) => scalar.to_string(),
                    nested => nested.to_string(),
                })
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR);
            *value = JsonValue::String(joined);
        }
    }
    record
}

/// Write records as newline-delimited JSON, one record per line
pub fn write_ndjson<W: Write>(records: &[JsonValue], mut out: W) -> Result<usize> {
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(records.len())
}

/// Write records as newline-delimited JSON to a file, optionally
/// gzip-compressed
pub fn write_ndjson_file(
    records: &[JsonValue],
    path: impl AsRef<Path>,
    compress: bool,
) -> Result<usize> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    let written = if compress {
        let mut encoder = GzEncoder::new(file, Compression::default());
        let written = write_ndjson(records, &mut encoder)?;
        encoder.finish()?;
        written
    } else {
        write_ndjson(records, file)?
    };
    debug!(path = %path.as_ref().display(), rows = written, compress, "wrote ndjson file");
    Ok(written)
}

/// Write records as CSV with a header row.
///
/// Records are flattened and list values compressed, then routed through an
/// Arrow record batch so column types stay consistent across rows.
pub fn write_csv<W: Write>(records: &[JsonValue], out: W) -> Result<usize> {
    let tabular: Vec<JsonValue> = records
        .iter()
        .map(|record| JsonValue::Object(compress_lists(flatten(record))))
        .collect();

    let batch = json_to_arrow(&tabular, None)?;
    let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(out);
    writer.write(&batch)?;
    Ok(batch.num_rows())
}

/// Write records as CSV to a file
pub fn write_csv_file(records: &[JsonValue], path: impl AsRef<Path>) -> Result<usize> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    let written = write_csv(records, file)?;
    debug!(path = %path.as_ref().display(), rows = written, "wrote csv file");
    Ok(written)
}

/// Write records as Parquet to a file. Nested objects are flattened into
/// columns; lists survive as Arrow list columns.
pub fn write_parquet_file(
    records: &[JsonValue],
    path: impl AsRef<Path>,
    options: Option<&ParquetOptions>,
) -> Result<usize> {
    let tabular: Vec<JsonValue> = records
        .iter()
        .map(|record| JsonValue::Object(flatten(record)))
        .collect();

    let batch = json_to_arrow(&tabular, None)?;
    let written = write_parquet(path.as_ref(), &batch, options)?;
    debug!(path = %path.as_ref().display(), rows = written, "wrote parquet file");
    Ok(written)
}
