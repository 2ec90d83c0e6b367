//! Parquet file writer

use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;

/// Tuning knobs for the Parquet output path
#[derive(Debug, Clone)]
pub struct ParquetOptions {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetOptions {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024,
        }
    }
}

impl ParquetOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    #[must_use]
    pub fn zstd(mut self) -> Self {
        self.compression = Compression::ZSTD(parquet::basic::ZstdLevel::default());
        self
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Write one record batch to a Parquet file, returning the row count
pub fn write_parquet(
    path: impl AsRef<Path>,
    batch: &RecordBatch,
    options: Option<&ParquetOptions>,
) -> Result<usize> {
    let defaults = ParquetOptions::default();
    let options = options.unwrap_or(&defaults);

    let file = File::create(path.as_ref())
        .map_err(|e| Error::export(format!("failed to create {}: {e}", path.as_ref().display())))?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(options.build_properties()))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(batch.num_rows())
}
