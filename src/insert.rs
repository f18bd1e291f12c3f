//! Chunked transactional insertion.
//!
//! Rows are written [`BATCH_SIZE`] at a time, each chunk in its own
//! transaction. A failing chunk is rolled back in full and reported as
//! [`LoadError::ChunkRolledBack`]; chunks committed before it stay committed,
//! so a large file can end up partially loaded.

use anyhow::Result;
use log::debug;

use crate::{
    error::LoadError,
    store::{Row, Store},
};

pub const BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// 1-based chunk number.
    pub chunk: usize,
    pub inserted: usize,
    pub total: usize,
}

pub fn insert_rows<S, F>(
    store: &mut S,
    table: &str,
    columns: &[String],
    rows: &[Row],
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<usize>
where
    S: Store + ?Sized,
    F: FnMut(ChunkProgress),
{
    let chunk_size = chunk_size.max(1);
    let total = rows.len();
    let mut inserted = 0usize;
    for (idx, chunk) in rows.chunks(chunk_size).enumerate() {
        let start = idx * chunk_size;
        if let Err(err) = store.insert_chunk(table, columns, chunk) {
            return Err(LoadError::ChunkRolledBack {
                chunk: idx + 1,
                rows: start..start + chunk.len(),
                committed: inserted,
                source: err.into(),
            }
            .into());
        }
        inserted += chunk.len();
        debug!("Committed chunk {} ({} row(s))", idx + 1, chunk.len());
        on_chunk(ChunkProgress {
            chunk: idx + 1,
            inserted,
            total,
        });
    }
    Ok(inserted)
}
