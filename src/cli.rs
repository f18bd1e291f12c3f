use std::path::PathBuf;

use clap::Parser;

use crate::{clear::ClearStrategy, mode::LoadMode};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Load SNOMED code usage extracts into a database table",
    long_about = "Load SNOMED code usage extracts into a database table.\n\n\
        Pass CONNECTION, SOURCE and TABLE together to run without any prompts. \
        With fewer arguments the remaining values come from the configuration \
        file and SNOMED_LOADER_* environment variables, and the operator is asked \
        to confirm each one."
)]
pub struct Cli {
    /// Connection string, source file or directory, and target table name
    #[arg(value_name = "CONNECTION SOURCE TABLE", num_args = 0..=3)]
    pub positional: Vec<String>,
    /// Which load pipeline to run
    #[arg(long, value_enum, default_value_t = LoadMode::MultiYear)]
    pub mode: LoadMode,
    /// How existing rows are cleared; skips the interactive menu
    #[arg(long, value_enum)]
    pub strategy: Option<ClearStrategy>,
    /// YAML file with connection_string, source_path and table_name defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Character encoding of the source files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Never prompt; take configured values as they are
    #[arg(long = "non-interactive")]
    pub non_interactive: bool,
    /// Exit without waiting for Enter
    #[arg(long = "no-pause")]
    pub no_pause: bool,
}
