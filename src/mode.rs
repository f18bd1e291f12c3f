//! Load modes.
//!
//! The loader grew through three shapes of the same pipeline: a plain copy of
//! a single extract into an all-text table, a single-file load with typed
//! usage and flag columns, and the multi-year load into a provisioned table.
//! [`LoadMode`] keeps them as one pipeline and decides the three things that
//! differ: how the schema is reconciled, whether the clear-strategy menu is
//! offered, and which column mappings are used.

use std::fmt;

use clap::ValueEnum;

use crate::{
    data::{BooleanFallback, ColumnType},
    rows::{ColumnMapping, ColumnSource},
    schema::{self, SchemaMode},
};

/// Geography recorded against every multi-year row.
pub const GEOGRAPHIC_COVERAGE: &str = "England";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Create the table if needed and copy every column as text
    Simple,
    /// Create the table if needed and type the usage and activity columns
    Typed,
    /// Load period-tagged extracts into a pre-provisioned table
    #[default]
    MultiYear,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoadMode::Simple => "simple",
            LoadMode::Typed => "typed",
            LoadMode::MultiYear => "multi-year",
        };
        f.write_str(label)
    }
}

impl LoadMode {
    pub fn schema_mode(self) -> SchemaMode {
        match self {
            LoadMode::Simple | LoadMode::Typed => SchemaMode::CreateIfMissing,
            LoadMode::MultiYear => SchemaMode::ValidateOnly,
        }
    }

    pub fn offers_strategy_menu(self) -> bool {
        self == LoadMode::MultiYear
    }

    pub fn column_mappings(self, headers: &[String]) -> Vec<ColumnMapping> {
        match self {
            LoadMode::Simple => headers
                .iter()
                .map(|name| ColumnMapping::field(name.clone(), ColumnType::Text))
                .collect(),
            LoadMode::Typed => headers
                .iter()
                .map(|name| ColumnMapping::field(name.clone(), typed_column_type(name)))
                .collect(),
            LoadMode::MultiYear => multi_year_mappings(),
        }
    }
}

fn typed_column_type(header: &str) -> ColumnType {
    if header.eq_ignore_ascii_case(schema::USAGE_COLUMN) {
        ColumnType::Integer
    } else if header.eq_ignore_ascii_case(schema::ACTIVE_AT_START_COLUMN)
        || header.eq_ignore_ascii_case(schema::ACTIVE_AT_END_COLUMN)
    {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}

fn multi_year_mappings() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::field(schema::CONCEPT_ID_COLUMN, ColumnType::Text),
        ColumnMapping::field(schema::DESCRIPTION_COLUMN, ColumnType::Text),
        ColumnMapping::field(schema::USAGE_COLUMN, ColumnType::Integer),
        ColumnMapping::field(schema::ACTIVE_AT_START_COLUMN, ColumnType::Boolean)
            .with_boolean_fallback(BooleanFallback::False),
        ColumnMapping::field(schema::ACTIVE_AT_END_COLUMN, ColumnType::Boolean)
            .with_boolean_fallback(BooleanFallback::False),
        ColumnMapping::synthesized(schema::PERIOD_COLUMN, ColumnSource::Period, ColumnType::Text),
        ColumnMapping::synthesized(
            schema::CREATED_DATE_COLUMN,
            ColumnSource::LoadTimestamp,
            ColumnType::Timestamp,
        ),
        ColumnMapping::synthesized(
            schema::GEOGRAPHY_COLUMN,
            ColumnSource::Literal(GEOGRAPHIC_COVERAGE.to_string()),
            ColumnType::Text,
        ),
    ]
}
