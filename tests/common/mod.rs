#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use snomed_usage_loader::store::SqliteStore;
use tempfile::{TempDir, tempdir};

/// DDL for the provisioned multi-year table, composite key included.
pub const USAGE_TABLE_DDL: &str = "CREATE TABLE usage (
    SNOMED_Concept_ID TEXT NOT NULL,
    Description TEXT,
    Usage INTEGER NOT NULL,
    Active_at_Start BOOLEAN NOT NULL,
    Active_at_End BOOLEAN NOT NULL,
    Data_Period TEXT NOT NULL,
    Created_Date TIMESTAMP,
    Geographic_Coverage TEXT,
    PRIMARY KEY (SNOMED_Concept_ID, Data_Period)
)";

pub const USAGE_HEADER: &str = "SNOMED_Concept_ID\tDescription\tUsage\tActive_at_Start\tActive_at_End";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a tab-separated usage extract with one line per `(id, usage)`.
    pub fn write_usage_extract(&self, name: &str, rows: &[(&str, &str)]) -> PathBuf {
        let mut contents = format!("{USAGE_HEADER}\n");
        for (id, usage) in rows {
            contents.push_str(&format!("{id}\tConcept {id}\t{usage}\t1\t1\n"));
        }
        self.write(name, &contents)
    }

    pub fn database_path(&self) -> PathBuf {
        self.temp_dir.path().join("usage.db")
    }
}

pub fn memory_store() -> SqliteStore {
    SqliteStore::open_in_memory().expect("in-memory store")
}

pub fn provisioned_store() -> SqliteStore {
    let store = memory_store();
    store
        .connection()
        .execute_batch(USAGE_TABLE_DDL)
        .expect("provision usage table");
    store
}

pub fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
        row.get(0)
    })
    .expect("count rows")
}

pub fn periods(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT Data_Period FROM \"{table}\" ORDER BY Data_Period, SNOMED_Concept_ID"
        ))
        .expect("prepare period query");
    let periods = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .expect("query periods")
        .collect::<Result<Vec<_>, _>>()
        .expect("collect periods");
    periods
}
