//! In-memory tabular datasets loaded from delimited files.
//!
//! A [`Dataset`] is an immutable snapshot: ordered headers plus rows of raw
//! string cells. Typing happens later, per field, in the detectors.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    error::{AuditError, AuditResult},
    io_utils,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    label: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Builds a dataset from already materialized headers and rows. Short rows
    /// are padded with empty cells so every row matches the header width.
    pub fn new(label: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            label: label.into(),
            headers,
            rows,
        }
    }

    /// Loads a delimited file. A missing path is reported as
    /// [`AuditError::SourceNotFound`] before any parsing happens.
    pub fn load(
        label: &str,
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self> {
        if !path.is_file() {
            return Err(AuditError::SourceNotFound {
                label: label.to_string(),
                path: path.to_path_buf(),
            }
            .into());
        }
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading headers from {path:?}"))?;
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {} of {path:?}", row_idx + 2))?;
            rows.push(decoded);
        }
        debug!(
            "Loaded {} row(s) across {} column(s) from {path:?}",
            rows.len(),
            headers.len()
        );
        Ok(Self::new(label, headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> AuditResult<usize> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| AuditError::UnknownColumn {
                dataset: self.label.clone(),
                column: name.to_string(),
            })
    }

    /// Raw cell at `row`/`column`; rows were padded at construction.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row][column].as_str()
    }
}
