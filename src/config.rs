//! Run configuration.
//!
//! [`LoaderConfig`] is built once at start-up and handed to the pipeline by
//! reference. Its three required values (connection descriptor, source path,
//! table name) are resolved in this order:
//!
//! 1. Exactly three positional arguments: used as-is, nothing else consulted.
//! 2. Otherwise any positional arguments given, then [`Settings`] gathered
//!    from an optional YAML file and `SNOMED_LOADER_*` environment variables.
//! 3. The operator is prompted for each value, with the value found so far
//!    offered as the default. `--non-interactive` takes the defaults as they
//!    are.
//!
//! Validation happens before the store is contacted.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;
use serde::Deserialize;

use crate::{
    clear::ClearStrategy, cli::Cli, console::Console, error::LoadError, io_utils,
    mode::LoadMode,
};

pub const CONFIG_PATH_VAR: &str = "SNOMED_LOADER_CONFIG";
pub const CONNECTION_VAR: &str = "SNOMED_LOADER_CONNECTION_STRING";
pub const SOURCE_VAR: &str = "SNOMED_LOADER_SOURCE_PATH";
pub const TABLE_VAR: &str = "SNOMED_LOADER_TABLE_NAME";

/// Defaults from the configuration source. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connection_string: Option<String>,
    pub source_path: Option<String>,
    pub table_name: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading configuration file {path:?}"))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing configuration file {path:?}"))
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut settings = Self::default();
        for (key, value) in vars {
            let slot = match key.as_ref() {
                CONNECTION_VAR => &mut settings.connection_string,
                SOURCE_VAR => &mut settings.source_path,
                TABLE_VAR => &mut settings.table_name,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        settings
    }

    /// Values present in `other` win.
    pub fn overlay(self, other: Settings) -> Settings {
        Settings {
            connection_string: other.connection_string.or(self.connection_string),
            source_path: other.source_path.or(self.source_path),
            table_name: other.table_name.or(self.table_name),
        }
    }

    /// Reads the YAML file (from `explicit` or `SNOMED_LOADER_CONFIG`) and
    /// overlays the environment variables.
    pub fn gather<I>(explicit: Option<&Path>, env: I) -> Result<Settings>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: Vec<(String, String)> = env.into_iter().collect();
        let file_path = explicit.map(Path::to_path_buf).or_else(|| {
            env.iter()
                .find(|(key, _)| key == CONFIG_PATH_VAR)
                .map(|(_, value)| PathBuf::from(value))
        });
        let base = match file_path {
            Some(path) => {
                debug!("Loading settings from {path:?}");
                Settings::load(&path)?
            }
            None => Settings::default(),
        };
        Ok(base.overlay(Settings::from_vars(env)))
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub connection: String,
    pub source: PathBuf,
    pub table: String,
    pub mode: LoadMode,
    pub strategy: Option<ClearStrategy>,
    /// Whether the operator may be asked questions during the run.
    pub interactive: bool,
    pub encoding: &'static Encoding,
}

impl LoaderConfig {
    pub fn new(connection: impl Into<String>, source: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            source: source.into(),
            table: table.into(),
            mode: LoadMode::default(),
            strategy: None,
            interactive: false,
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: ClearStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Builds the configuration from the command line, the configuration
    /// source and, when allowed, the console.
    pub fn resolve<C: Console + ?Sized>(
        cli: &Cli,
        settings: impl FnOnce() -> Result<Settings>,
        console: &mut C,
    ) -> Result<Self> {
        let encoding = io_utils::resolve_encoding(cli.input_encoding.as_deref())?;
        let bypass = cli.positional.len() == 3;
        let (connection, source, table) = if bypass {
            debug!("Three positional arguments given; skipping settings and prompts");
            (
                cli.positional[0].clone(),
                cli.positional[1].clone(),
                cli.positional[2].clone(),
            )
        } else {
            let settings = settings()?;
            let arg = |idx: usize| cli.positional.get(idx).cloned();
            let defaults = [
                arg(0).or(settings.connection_string),
                arg(1).or(settings.source_path),
                arg(2).or(settings.table_name),
            ];
            let [connection, source, table] = if cli.non_interactive {
                defaults.map(Option::unwrap_or_default)
            } else {
                console.show("Please provide the following information:");
                let [c, s, t] = defaults;
                [
                    ask(console, "Connection string", c)?,
                    ask(console, "Source path (file or directory)", s)?,
                    ask(console, "Target table name", t)?,
                ]
            };
            (connection, source, table)
        };
        let config = LoaderConfig {
            connection: connection.trim().to_string(),
            source: PathBuf::from(source.trim()),
            table: table.trim().to_string(),
            mode: cli.mode,
            strategy: cli.strategy,
            interactive: !bypass && !cli.non_interactive,
            encoding,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that cannot possibly load anything.
    pub fn validate(&self) -> Result<()> {
        if self.connection.trim().is_empty() {
            return Err(LoadError::InvalidConfig("connection string cannot be empty".into()).into());
        }
        if self.source.as_os_str().is_empty() || !self.source.exists() {
            return Err(LoadError::InvalidConfig(format!(
                "source path {:?} is invalid or does not exist",
                self.source
            ))
            .into());
        }
        if self.table.trim().is_empty() {
            return Err(LoadError::InvalidConfig("table name cannot be empty".into()).into());
        }
        Ok(())
    }
}

fn ask<C: Console + ?Sized>(console: &mut C, label: &str, default: Option<String>) -> Result<String> {
    let prompt = match default.as_deref() {
        Some(value) if !value.is_empty() => format!("{label} [{value}]: "),
        _ => format!("{label}: "),
    };
    let answer = console.read_line(&prompt)?.unwrap_or_default();
    if answer.trim().is_empty() {
        Ok(default.unwrap_or_default())
    } else {
        Ok(answer)
    }
}
