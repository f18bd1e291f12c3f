pub mod clear;
pub mod cli;
pub mod config;
pub mod console;
pub mod data;
pub mod error;
pub mod insert;
pub mod io_utils;
pub mod load;
pub mod mode;
pub mod period;
pub mod reader;
pub mod rows;
pub mod schema;
pub mod store;
pub mod table;

use std::{env, process::ExitCode, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, error, info};

use crate::{
    cli::Cli,
    config::{LoaderConfig, Settings},
    console::{Console, TerminalConsole},
    error::find_load_error,
    load::RunOutcome,
    store::SqliteStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("snomed_usage_loader", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let mut console = TerminalConsole::new();
    run_with(&cli, &mut console)
}

/// Runs the loader for already-parsed arguments and maps the result to the
/// process exit status.
pub fn run_with<C: Console + ?Sized>(cli: &Cli, console: &mut C) -> ExitCode {
    console.show("SNOMED Code Usage Data Loader");
    console.show("=============================");

    let code = match execute(cli, console) {
        Ok(RunOutcome::Completed(summary)) => {
            if !summary.files.is_empty() {
                console.show(&table::render_summary(&summary));
            }
            if summary.failed() == 0 {
                console.show("Data loading completed successfully!");
                ExitCode::SUCCESS
            } else {
                console.show(&format!(
                    "Data loading finished with {} failed file(s); {} row(s) inserted.",
                    summary.failed(),
                    summary.rows_inserted()
                ));
                ExitCode::FAILURE
            }
        }
        Ok(RunOutcome::Cancelled) => return ExitCode::SUCCESS,
        Ok(RunOutcome::Stopped(summary)) => {
            console.show(&table::render_summary(&summary));
            return ExitCode::FAILURE;
        }
        Err(err) => {
            error!("{err:#}");
            if find_load_error(&err).is_some_and(|e| e.is_fatal()) {
                console.show(&format!("Error: {err:#}"));
                return ExitCode::FAILURE;
            }
            console.show(&format!("Error: {err}"));
            console.show(&format!("Stack trace: {err:?}"));
            ExitCode::FAILURE
        }
    };

    if !cli.no_pause {
        let _ = console.read_line("Press Enter to exit...");
    }
    code
}

fn execute<C: Console + ?Sized>(cli: &Cli, console: &mut C) -> Result<RunOutcome> {
    let config = LoaderConfig::resolve(
        cli,
        || Settings::gather(cli.config.as_deref(), env::vars()),
        console,
    )?;
    info!(
        "Loading {:?} into table '{}' ({} mode)",
        config.source, config.table, config.mode
    );
    let mut store = SqliteStore::open(&config.connection)
        .with_context(|| "Connecting to the destination database")?;
    console.show("Connected to the database successfully.");
    load::execute(&config, &mut store, console)
}
