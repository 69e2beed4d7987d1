//! Persistence for the fetched dataset and the aggregate hand-off.
//!
//! The dataset is a CSV whose header is written once, before the first
//! batch, and which is flushed after every page so earlier pages survive a
//! later failure.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AggregateError, FetchError};
use crate::fetch::Record;

/// Incremental CSV writer for API records.
///
/// The column set is fixed by the first record written; later records are
/// laid out in that order and missing fields become empty cells.
pub struct DatasetWriter<W: Write> {
    writer: csv::Writer<W>,
    columns: Option<Vec<String>>,
}

impl DatasetWriter<File> {
    /// Creates (or truncates) the file at `path`, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "Creating dataset file");
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            // Header is emitted by hand from the first record's keys.
            writer: WriterBuilder::new().has_headers(false).from_writer(inner),
            columns: None,
        }
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn has_header(&self) -> bool {
        self.columns.is_some()
    }

    /// Appends `records` and flushes. Returns the number of rows written.
    pub fn append(&mut self, records: &[Record]) -> Result<usize, FetchError> {
        let Some(first) = records.first() else {
            return Ok(0);
        };

        if self.columns.is_none() {
            let header: Vec<String> = first.keys().cloned().collect();
            self.writer.write_record(&header)?;
            self.columns = Some(header);
        }

        let columns = self.columns.as_deref().unwrap_or_default();
        for record in records {
            self.writer
                .write_record(columns.iter().map(|c| cell(record.get(c))))?;
        }
        self.writer.flush()?;

        Ok(records.len())
    }

    pub fn into_inner(self) -> Result<W, FetchError> {
        self.writer
            .into_inner()
            .map_err(|e| FetchError::Io(e.into_error()))
    }
}

/// Renders a JSON value as a CSV cell. Strings are written unquoted,
/// nulls and absent fields as empty cells.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Writes `value` as pretty-printed JSON to `path`, creating parent directories.
pub fn write_json(path: impl AsRef<Path>, value: &impl Serialize) -> Result<(), AggregateError> {
    let path = path.as_ref();
    let io_err = |source| AggregateError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(path, body).map_err(io_err)?;

    debug!(path = %path.display(), "JSON written");
    Ok(())
}
