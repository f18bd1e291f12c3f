//! Classified load failures.
//!
//! Most of the crate reports errors through `anyhow` with context attached at
//! each layer. The variants here are the failures that callers need to tell
//! apart (a missing period column ends the whole run, a rolled-back chunk
//! only ends the current file), so they are raised as [`LoadError`] and
//! recovered with `anyhow::Error::downcast_ref`.

use std::{ops::Range, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No header row found in {path:?}")]
    MissingHeader { path: PathBuf },

    #[error("No files matching '{pattern}' found in {dir:?}")]
    NoSourceFiles { dir: PathBuf, pattern: String },

    #[error("Table '{table}' does not exist; it must be provisioned before loading")]
    TableMissing { table: String },

    #[error("Table '{table}' is missing required column(s): {}", missing.join(", "))]
    SchemaMismatch { table: String, missing: Vec<String> },

    #[error(
        "Table '{table}' has no '{column}' column; rows cannot be deleted by period"
    )]
    PeriodColumnMissing { table: String, column: String },

    #[error(
        "Chunk {chunk} (rows {}-{}) was rolled back; {committed} row(s) were already committed",
        rows.start + 1,
        rows.end
    )]
    ChunkRolledBack {
        chunk: usize,
        rows: Range<usize>,
        committed: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LoadError {
    /// Errors that must end the run instead of moving on to the next file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadError::PeriodColumnMissing { .. })
    }
}

/// Finds a [`LoadError`] anywhere in an `anyhow` chain.
pub fn find_load_error(err: &anyhow::Error) -> Option<&LoadError> {
    err.chain().find_map(|cause| cause.downcast_ref::<LoadError>())
}
