//! File orchestration: discovery, strategy choice, and the per-file
//! read → period → reconcile → clear → map → insert sequence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use log::{error, info, warn};

use crate::{
    clear::{self, ClearOutcome, ClearPlan, ClearStrategy},
    config::LoaderConfig,
    console::{self, Console, StrategyChoice},
    error::{LoadError, find_load_error},
    insert::{self, BATCH_SIZE},
    period::extract_period,
    reader,
    rows::{self, ColumnMapping, RowMapper},
    schema::{self, Reconciliation},
    store::Store,
};

pub const SOURCE_FILE_PREFIX: &str = "SNOMED_code_usage_";
pub const SOURCE_FILE_SUFFIX: &str = ".txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub period: String,
    pub records: usize,
    pub inserted: usize,
    pub created_table: bool,
    pub clear: ClearOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Loaded(FileReport),
    Failed { path: PathBuf, message: String },
}

impl FileStatus {
    pub fn path(&self) -> &Path {
        match self {
            FileStatus::Loaded(report) => &report.path,
            FileStatus::Failed { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: Vec<FileStatus>,
}

impl RunSummary {
    pub fn rows_inserted(&self) -> usize {
        self.files
            .iter()
            .map(|status| match status {
                FileStatus::Loaded(report) => report.inserted,
                FileStatus::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|status| matches!(status, FileStatus::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// The operator picked cancel at the strategy menu.
    Cancelled,
    /// A file failed and the operator chose not to go on.
    Stopped(RunSummary),
}

fn is_source_file_name(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    lowered.starts_with(&SOURCE_FILE_PREFIX.to_ascii_lowercase())
        && lowered.ends_with(SOURCE_FILE_SUFFIX)
}

/// Files selected for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    pub files: Vec<PathBuf>,
    /// The source named one file rather than a directory.
    pub single: bool,
}

/// A file path is returned as-is. A directory is scanned (not recursively) for
/// `SNOMED_code_usage_*.txt` and the matches are sorted by file name.
pub fn discover_files(source: &Path) -> Result<SourceFiles> {
    if source.is_file() {
        return Ok(SourceFiles {
            files: vec![source.to_path_buf()],
            single: true,
        });
    }
    let entries =
        fs::read_dir(source).with_context(|| format!("Listing source directory {source:?}"))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Listing source directory {source:?}"))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_source_file_name);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(LoadError::NoSourceFiles {
            dir: source.to_path_buf(),
            pattern: format!("{SOURCE_FILE_PREFIX}*{SOURCE_FILE_SUFFIX}"),
        }
        .into());
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(SourceFiles {
        files,
        single: false,
    })
}

/// Picks the run's clear strategy: the configured one, else the menu when
/// the mode offers it and the operator can be asked, else append.
pub fn choose_strategy<C: Console + ?Sized>(
    config: &LoaderConfig,
    console: &mut C,
) -> Result<StrategyChoice> {
    if let Some(strategy) = config.strategy {
        return Ok(StrategyChoice::Strategy(strategy));
    }
    if config.mode.offers_strategy_menu() && config.interactive {
        return console::prompt_strategy(console);
    }
    Ok(StrategyChoice::Strategy(ClearStrategy::Append))
}

pub fn execute<S, C>(config: &LoaderConfig, store: &mut S, console: &mut C) -> Result<RunOutcome>
where
    S: Store + ?Sized,
    C: Console + ?Sized,
{
    let SourceFiles { files, single } = discover_files(&config.source)?;
    info!(
        "Loading {} file(s) from {:?} into '{}' ({} mode)",
        files.len(),
        config.source,
        config.table,
        config.mode
    );

    let strategy = match choose_strategy(config, console)? {
        StrategyChoice::Strategy(strategy) => strategy,
        StrategyChoice::Cancel => {
            console.show("Load cancelled.");
            return Ok(RunOutcome::Cancelled);
        }
    };
    if strategy == ClearStrategy::Append {
        warn!("Append selected; rows that duplicate existing keys may violate table constraints");
        console.show(
            "Warning: existing rows are kept. Rows that duplicate existing keys may be rejected by the table.",
        );
    }
    let mut plan = ClearPlan::new(strategy);
    let mut summary = RunSummary::default();

    for (idx, path) in files.iter().enumerate() {
        console.show(&format!("Processing file {} of {}: {}", idx + 1, files.len(), path.display()));
        match load_file(config, store, console, path, &mut plan) {
            Ok(report) => {
                console.show(&format!(
                    "Loaded {} record(s) for period {} from {}",
                    report.inserted,
                    report.period,
                    path.display()
                ));
                summary.files.push(FileStatus::Loaded(report));
            }
            Err(err) => {
                let fatal = find_load_error(&err).is_some_and(LoadError::is_fatal);
                if single || fatal {
                    return Err(err);
                }
                error!("Failed to load {path:?}: {err:#}");
                console.show(&format!("Error loading {}: {err:#}", path.display()));
                summary.files.push(FileStatus::Failed {
                    path: path.clone(),
                    message: format!("{err:#}"),
                });
                let remaining = files.len() - idx - 1;
                if remaining > 0 {
                    let go_on = config.interactive
                        && console::confirm(
                            console,
                            &format!("Continue with the remaining {remaining} file(s)?"),
                        )?;
                    if !go_on {
                        console.show("Stopping; remaining files were not loaded.");
                        return Ok(RunOutcome::Stopped(summary));
                    }
                }
            }
        }
    }

    Ok(RunOutcome::Completed(summary))
}

pub fn load_file<S, C>(
    config: &LoaderConfig,
    store: &mut S,
    console: &mut C,
    path: &Path,
    plan: &mut ClearPlan,
) -> Result<FileReport>
where
    S: Store + ?Sized,
    C: Console + ?Sized,
{
    let file = reader::read_delimited(path, config.encoding)?;
    console.show(&format!(
        "Read {} record(s) with {} column(s): {}",
        file.records.len(),
        file.headers.len(),
        file.headers.join(", ")
    ));
    if file.skipped_rows > 0 {
        warn!("{} unreadable row(s) skipped in {path:?}", file.skipped_rows);
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let period = extract_period(&file_name);
    info!("Data period for {file_name}: {period}");

    let strategy = plan.current();
    clear::ensure_applicable(store, &config.table, strategy)?;

    let mappings = config.mode.column_mappings(&file.headers);
    let definition = mappings.iter().map(ColumnMapping::column_def).collect::<Vec<_>>();
    let reconciliation = schema::reconcile(store, &config.table, config.mode.schema_mode(), &definition)
        .with_context(|| format!("Reconciling table '{}'", config.table))?;
    let created_table = matches!(reconciliation, Reconciliation::Created { .. });
    if created_table {
        console.show(&format!("Table '{}' created.", config.table));
    }

    let mappings = rows::fit_to_table(mappings, reconciliation.columns());

    let clear = clear::apply(store, &config.table, strategy, &period)
        .with_context(|| format!("Clearing table '{}' ({strategy})", config.table))?;
    plan.record_applied(strategy);
    match &clear {
        ClearOutcome::Truncated { rows } => {
            console.show(&format!("Removed all {rows} existing row(s)."))
        }
        ClearOutcome::DeletedPeriod { period, rows } => {
            console.show(&format!("Removed {rows} existing row(s) for period {period}."))
        }
        ClearOutcome::Appended | ClearOutcome::NothingToClear => {}
    }

    let mapper = RowMapper::new(mappings, period.clone(), Local::now().naive_local());
    let columns = mapper.target_columns();
    let rows = mapper.map_records(&file.records);
    if rows.is_empty() {
        console.show("No data to insert.");
    } else {
        console.show(&format!("Inserting {} record(s)...", rows.len()));
    }
    let inserted = insert::insert_rows(store, &config.table, &columns, &rows, BATCH_SIZE, |p| {
        console.show(&format!("Inserted {} of {} records...", p.inserted, p.total));
    })
    .with_context(|| format!("Inserting rows from {path:?}"))?;

    Ok(FileReport {
        path: path.to_path_buf(),
        period,
        records: file.records.len(),
        inserted,
        created_table,
        clear,
    })
}
