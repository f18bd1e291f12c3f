//! Clear strategies applied before each file is inserted.

use std::fmt;

use anyhow::Result;
use clap::ValueEnum;
use log::{debug, info};

use crate::{error::LoadError, schema, store::Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ClearStrategy {
    /// Remove every existing row before the first file
    Truncate,
    /// Remove only rows carrying the period of the file being loaded
    DeleteByPeriod,
    /// Keep existing rows and add new ones alongside
    Append,
}

impl fmt::Display for ClearStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClearStrategy::Truncate => "truncate",
            ClearStrategy::DeleteByPeriod => "delete-by-period",
            ClearStrategy::Append => "append",
        };
        f.write_str(label)
    }
}

/// Hands out the run's strategy file by file.
///
/// A truncate is only ever applied once per run: after it has been applied
/// the plan answers `Append` for every remaining file.
#[derive(Debug, Clone)]
pub struct ClearPlan {
    chosen: ClearStrategy,
    truncated: bool,
}

impl ClearPlan {
    pub fn new(chosen: ClearStrategy) -> Self {
        Self {
            chosen,
            truncated: false,
        }
    }

    pub fn chosen(&self) -> ClearStrategy {
        self.chosen
    }

    pub fn current(&self) -> ClearStrategy {
        match self.chosen {
            ClearStrategy::Truncate if self.truncated => ClearStrategy::Append,
            other => other,
        }
    }

    pub fn record_applied(&mut self, applied: ClearStrategy) {
        if applied == ClearStrategy::Truncate {
            self.truncated = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Truncated { rows: usize },
    DeletedPeriod { period: String, rows: usize },
    Appended,
    /// The table does not exist, so there was nothing to clear.
    NothingToClear,
}

impl fmt::Display for ClearOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearOutcome::Truncated { rows } => write!(f, "truncated ({rows} removed)"),
            ClearOutcome::DeletedPeriod { period, rows } => {
                write!(f, "deleted {period} ({rows} removed)")
            }
            ClearOutcome::Appended => f.write_str("appended"),
            ClearOutcome::NothingToClear => f.write_str("no table"),
        }
    }
}

/// Fails with [`LoadError::PeriodColumnMissing`] when `strategy` deletes by
/// period and `table` exists without a period column. Runs before the schema
/// is reconciled so the fatal error wins over a schema mismatch.
pub fn ensure_applicable<S: Store + ?Sized>(
    store: &mut S,
    table: &str,
    strategy: ClearStrategy,
) -> Result<()> {
    if strategy == ClearStrategy::DeleteByPeriod && store.table_exists(table)? {
        period_column(store, table)?;
    }
    Ok(())
}

fn period_column<S: Store + ?Sized>(store: &mut S, table: &str) -> Result<String> {
    store
        .column_names(table)?
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case(schema::PERIOD_COLUMN))
        .ok_or_else(|| {
            LoadError::PeriodColumnMissing {
                table: table.to_string(),
                column: schema::PERIOD_COLUMN.to_string(),
            }
            .into()
        })
}

pub fn apply<S: Store + ?Sized>(
    store: &mut S,
    table: &str,
    strategy: ClearStrategy,
    period: &str,
) -> Result<ClearOutcome> {
    if strategy == ClearStrategy::Append {
        debug!("Appending to '{table}' without clearing");
        return Ok(ClearOutcome::Appended);
    }
    if !store.table_exists(table)? {
        return Ok(ClearOutcome::NothingToClear);
    }
    match strategy {
        ClearStrategy::Truncate => {
            let rows = store.truncate(table)?;
            info!("Truncated '{table}' ({rows} row(s) removed)");
            Ok(ClearOutcome::Truncated { rows })
        }
        ClearStrategy::DeleteByPeriod => {
            let column = period_column(store, table)?;
            let rows = store.delete_where_equals(table, &column, period)?;
            info!("Deleted {rows} row(s) for period {period} from '{table}'");
            Ok(ClearOutcome::DeletedPeriod {
                period: period.to_string(),
                rows,
            })
        }
        ClearStrategy::Append => Ok(ClearOutcome::Appended),
    }
}
