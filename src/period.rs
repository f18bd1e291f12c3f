//! Data period labels derived from extract file names.

use std::sync::OnceLock;

use regex::Regex;

/// Label used when a file name carries no `YYYY-YY` period.
pub const DEFAULT_DATA_PERIOD: &str = "Unknown";

fn period_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4}-\d{2}").expect("period pattern is valid"))
}

/// Returns the first `YYYY-YY` run in `file_name`, or [`DEFAULT_DATA_PERIOD`].
///
/// Only the name is inspected. A file whose name says 2022-23 but whose rows
/// describe another year is loaded as 2022-23.
pub fn extract_period(file_name: &str) -> String {
    period_pattern()
        .find(file_name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_DATA_PERIOD.to_string())
}
