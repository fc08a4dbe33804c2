//! Streaming CSV to JSON transcoding
//!
//! The CSV is read one record at a time and every record is written out as soon as
//! it is parsed, so neither file is ever held in memory. The output is a JSON array
//! of objects keyed by the header row, written next to the source as
//! `<basename>.json`.
//!
//! # Example
//!
//! ```no_run
//! use csvjob_common::transcode::transcode_csv_to_json;
//!
//! # async fn example() -> csvjob_common::Result<()> {
//! let summary = transcode_csv_to_json("uploads/3f2c.csv").await?;
//! tracing::info!(rows = summary.rows, path = %summary.json_path.display(), "converted");
//! # Ok(())
//! # }
//! ```

use crate::error::{CsvJobError, Result};
use csv_async::{AsyncReaderBuilder, StringRecord};
use futures::StreamExt;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

/// Derive the JSON artifact path for a CSV source path
pub fn artifact_path(csv_path: impl AsRef<Path>) -> PathBuf {
    csv_path.as_ref().with_extension("json")
}

/// One parsed CSV record: column name to raw cell text, in column order
///
/// Cells beyond the header width are keyed `_<index>`. When a header name repeats,
/// the later cell wins and keeps the position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    fields: Vec<(String, String)>,
}

impl CsvRow {
    pub fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        let mut fields: Vec<(String, String)> = Vec::with_capacity(record.len());

        for (index, value) in record.iter().enumerate() {
            let column = match headers.get(index) {
                Some(name) => name.to_string(),
                None => format!("_{index}"),
            };

            match fields.iter_mut().find(|(name, _)| *name == column) {
                Some(existing) => existing.1 = value.to_string(),
                None => fields.push((column, value.to_string())),
            }
        }

        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl Serialize for CsvRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of a successful transcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub json_path: PathBuf,
    pub rows: u64,
}

/// Convert `csv_path` into a JSON array written to [`artifact_path`]
///
/// Fails fast with [`CsvJobError::FileNotFound`] when the source does not exist.
/// A parse or write failure part-way through removes the partial JSON file before
/// the error is returned.
#[tracing::instrument(skip_all, fields(csv = %csv_path.as_ref().display()))]
pub async fn transcode_csv_to_json(csv_path: impl AsRef<Path>) -> Result<TranscodeSummary> {
    let csv_path = csv_path.as_ref();

    if let Err(e) = tokio::fs::metadata(csv_path).await {
        warn!("CSV source missing before transcode");
        return Err(CsvJobError::from_io(e, csv_path));
    }

    let json_path = artifact_path(csv_path);
    debug!(json = %json_path.display(), "Starting CSV transcode");

    match write_json_array(csv_path, &json_path).await {
        Ok(rows) => {
            info!(rows, json = %json_path.display(), "CSV transcoded to JSON");
            Ok(TranscodeSummary { json_path, rows })
        },
        Err(e) => {
            warn!(error = %e, "CSV transcode failed, removing partial output");
            if let Err(cleanup) = tokio::fs::remove_file(&json_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %cleanup, json = %json_path.display(), "Failed to remove partial JSON");
                }
            }
            Err(e)
        },
    }
}

async fn write_json_array(csv_path: &Path, json_path: &Path) -> Result<u64> {
    let source = tokio::fs::File::open(csv_path)
        .await
        .map_err(|e| CsvJobError::from_io(e, csv_path))?;

    let mut reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .create_reader(source);

    let headers = reader.headers().await?.clone();

    let sink = tokio::fs::File::create(json_path).await?;
    let mut out = BufWriter::new(sink);
    out.write_all(b"[").await?;

    let mut rows = 0u64;
    let mut records = reader.records();
    while let Some(record) = records.next().await {
        let record = record?;
        if rows > 0 {
            out.write_all(b",").await?;
        }
        let row = CsvRow::from_record(&headers, &record);
        out.write_all(&serde_json::to_vec(&row)?).await?;
        rows += 1;
    }

    out.write_all(b"]").await?;
    out.flush().await?;

    Ok(rows)
}
