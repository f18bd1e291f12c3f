//! Destination store seam.
//!
//! The load pipeline only needs a handful of operations from the database:
//! two metadata probes, `CREATE TABLE`, two kinds of delete, and a chunked
//! insert that commits or rolls back as a unit. [`Store`] names exactly those,
//! and [`SqliteStore`] implements them on `rusqlite`.

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::debug;
use rusqlite::{
    Connection, params, params_from_iter,
    types::{ToSql, ToSqlOutput},
};

use crate::data::{ColumnType, TIMESTAMP_FORMAT, Value};

/// Column of a table to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// One mapped row; `None` is written as SQL `NULL`.
pub type Row = Vec<Option<Value>>;

pub trait Store {
    fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// Live column names in table order. Empty when the table is absent.
    fn column_names(&mut self, table: &str) -> Result<Vec<String>>;

    /// Creates `table` with an identity key column followed by `columns`.
    fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> Result<()>;

    /// Removes every row and returns how many were removed.
    fn truncate(&mut self, table: &str) -> Result<usize>;

    /// Removes rows whose `column` equals `value`.
    fn delete_where_equals(&mut self, table: &str, column: &str, value: &str) -> Result<usize>;

    /// Inserts `rows` one statement at a time inside a single transaction.
    /// On error nothing from this call is left behind.
    fn insert_chunk(&mut self, table: &str, columns: &[String], rows: &[Row]) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens a SQLite database from a connection descriptor: a file path,
    /// `:memory:`, or either prefixed with `sqlite:` / `sqlite://`.
    pub fn open(descriptor: &str) -> Result<Self> {
        let target = database_path(descriptor);
        let conn = Connection::open(target)
            .with_context(|| format!("Opening SQLite database '{target}'"))?;
        debug!("Connected to SQLite database '{target}'");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory().context("Opening in-memory SQLite database")?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn database_path(descriptor: &str) -> &str {
    let trimmed = descriptor.trim();
    trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed)
}

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn create_table_sql(table: &str, columns: &[ColumnDef]) -> String {
    let definitions = std::iter::once("\"Id\" INTEGER PRIMARY KEY AUTOINCREMENT".to_string())
        .chain(columns.iter().map(|column| {
            format!(
                "{} {}",
                quote_identifier(&column.name),
                column.column_type.sql_type()
            )
        }))
        .join(",\n    ");
    format!(
        "CREATE TABLE {} (\n    {definitions}\n)",
        quote_identifier(table)
    )
}

pub fn insert_sql(table: &str, columns: &[String]) -> String {
    let names = columns.iter().map(|c| quote_identifier(c)).join(", ");
    let placeholders = (1..=columns.len()).map(|idx| format!("?{idx}")).join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_identifier(table)
    )
}

impl Store for SqliteStore {
    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                params![table],
                |row| row.get(0),
            )
            .with_context(|| format!("Checking whether table '{table}' exists"))?;
        Ok(count > 0)
    }

    fn column_names(&mut self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .context("Preparing column listing")?;
        let names = stmt
            .query_map(params![table], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .with_context(|| format!("Listing columns of '{table}'"))?;
        Ok(names)
    }

    fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> Result<()> {
        let sql = create_table_sql(table, columns);
        debug!("{sql}");
        self.conn
            .execute_batch(&sql)
            .with_context(|| format!("Creating table '{table}'"))
    }

    fn truncate(&mut self, table: &str) -> Result<usize> {
        // SQLite has no TRUNCATE; an unqualified DELETE takes the truncate path.
        let sql = format!("DELETE FROM {}", quote_identifier(table));
        self.conn
            .execute(&sql, [])
            .with_context(|| format!("Truncating table '{table}'"))
    }

    fn delete_where_equals(&mut self, table: &str, column: &str, value: &str) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_identifier(table),
            quote_identifier(column)
        );
        self.conn
            .execute(&sql, params![value])
            .with_context(|| format!("Deleting rows from '{table}' where {column} = '{value}'"))
    }

    fn insert_chunk(&mut self, table: &str, columns: &[String], rows: &[Row]) -> Result<()> {
        let sql = insert_sql(table, columns);
        // Dropping `tx` without commit rolls the whole chunk back.
        let tx = self.conn.transaction().context("Beginning transaction")?;
        {
            let mut stmt = tx
                .prepare(&sql)
                .with_context(|| format!("Preparing insert into '{table}'"))?;
            for (idx, row) in rows.iter().enumerate() {
                if row.len() != columns.len() {
                    return Err(anyhow!(
                        "Row {} has {} value(s) but {} column(s) were given",
                        idx + 1,
                        row.len(),
                        columns.len()
                    ));
                }
                stmt.execute(params_from_iter(row.iter()))
                    .with_context(|| format!("Inserting row {} of chunk", idx + 1))?;
            }
        }
        tx.commit().context("Committing transaction")
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Text(text) => ToSqlOutput::from(text.as_str()),
            Value::Integer(number) => ToSqlOutput::from(*number),
            Value::Boolean(flag) => ToSqlOutput::from(*flag),
            Value::Timestamp(ts) => ToSqlOutput::from(ts.format(TIMESTAMP_FORMAT).to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn descriptor_prefixes_are_stripped() {
        assert_eq!(database_path("sqlite://data/usage.db"), "data/usage.db");
        assert_eq!(database_path("sqlite::memory:"), ":memory:");
        assert_eq!(database_path(" usage.db "), "usage.db");
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("Usage"), "\"Usage\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn create_table_adds_identity_key() {
        let mut store = store();
        store
            .create_table(
                "usage",
                &[
                    ColumnDef::new("code", ColumnType::Text),
                    ColumnDef::new("count", ColumnType::Integer),
                ],
            )
            .unwrap();
        assert!(store.table_exists("usage").unwrap());
        assert!(store.table_exists("USAGE").unwrap());
        assert_eq!(
            store.column_names("usage").unwrap(),
            vec!["Id".to_string(), "code".to_string(), "count".to_string()]
        );
        assert!(store.column_names("missing").unwrap().is_empty());
    }

    #[test]
    fn failed_chunk_leaves_nothing_behind() {
        let mut store = store();
        store
            .connection()
            .execute_batch("CREATE TABLE t (code TEXT NOT NULL)")
            .unwrap();
        let columns = vec!["code".to_string()];
        let rows = vec![vec![Some(Value::Text("a".into()))], vec![None]];
        assert!(store.insert_chunk("t", &columns, &rows).is_err());
        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn delete_and_truncate_report_row_counts() {
        let mut store = store();
        store
            .connection()
            .execute_batch(
                "CREATE TABLE t (period TEXT);
                 INSERT INTO t VALUES ('2022-23'), ('2022-23'), ('2023-24');",
            )
            .unwrap();
        assert_eq!(store.delete_where_equals("t", "period", "2022-23").unwrap(), 2);
        assert_eq!(store.truncate("t").unwrap(), 1);
    }
}
