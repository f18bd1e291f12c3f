//! Delimited text reader.
//!
//! Turns a tab- or comma-separated extract into an in-memory list of
//! [`Record`]s. The delimiter is picked once from the first line, the header
//! row names the columns, and every later line is mapped onto those names
//! positionally. Blank cells become `None`.
//!
//! The reader is deliberately forgiving: short rows are padded with `None`,
//! surplus cells are dropped, and lines the tokenizer rejects are logged and
//! skipped. Only a missing header row stops a file.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, warn};

use crate::{error::LoadError, io_utils};

/// One data row as an ordered column-name to value mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Record {
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `None` when the column does not exist, `Some(None)` for a null cell.
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|idx| self.values[idx].as_deref())
    }

    pub fn get_ignore_case(&self, column: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .map(|idx| self.values[idx].as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }
}

#[derive(Debug, Clone)]
pub struct DelimitedFile {
    pub delimiter: u8,
    pub headers: Arc<[String]>,
    pub records: Vec<Record>,
    pub skipped_rows: usize,
}

pub fn read_delimited(path: &Path, encoding: &'static Encoding) -> Result<DelimitedFile> {
    let text = io_utils::read_to_string(path, encoding)?;
    parse_delimited(&text).map_err(|err| match err.downcast::<MissingHeader>() {
        Ok(_) => anyhow::Error::new(LoadError::MissingHeader {
            path: path.to_path_buf(),
        }),
        Err(other) => other.context(format!("Parsing {path:?}")),
    })
}

#[derive(Debug, thiserror::Error)]
#[error("No header row found")]
pub struct MissingHeader;

/// Parses already-decoded text. Fails with [`MissingHeader`] when the text has
/// no usable header row.
pub fn parse_delimited(text: &str) -> Result<DelimitedFile> {
    let delimiter = io_utils::detect_delimiter(text);
    let mut reader = io_utils::open_csv_reader(text, delimiter);
    let raw_headers = reader.headers().context("Reading header row")?.clone();
    if raw_headers.iter().all(|name| name.trim().is_empty()) {
        return Err(MissingHeader.into());
    }
    let headers: Arc<[String]> = raw_headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                trimmed.to_string()
            }
        })
        .collect();
    debug!(
        "Detected delimiter '{}' with {} column(s): {:?}",
        io_utils::printable_delimiter(delimiter),
        headers.len(),
        headers
    );

    let mut records = Vec::new();
    let mut skipped_rows = 0usize;
    for (row_idx, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!("Skipping unreadable row {}: {err}", row_idx + 2);
                skipped_rows += 1;
                continue;
            }
        };
        let values = (0..headers.len())
            .map(|idx| row.get(idx).and_then(non_blank))
            .collect();
        records.push(Record::new(Arc::clone(&headers), values));
    }

    Ok(DelimitedFile {
        delimiter,
        headers,
        records,
        skipped_rows,
    })
}

fn non_blank(field: &str) -> Option<String> {
    if field.trim().is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}
