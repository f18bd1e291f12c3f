//! Record to row mapping.
//!
//! A [`RowMapper`] holds one [`ColumnMapping`] per destination column. Each
//! mapping says where the value comes from (a source field or something
//! synthesized for the whole file) and what type it must be coerced to. See
//! [`crate::data::coerce_value`] for the coercion rules.

use chrono::NaiveDateTime;
use log::info;

use crate::{
    data::{BooleanFallback, ColumnType, Value, coerce_value},
    reader::Record,
    schema::has_column,
    store::{ColumnDef, Row},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// Field of the source record, looked up ignoring case.
    Field(String),
    /// The data period of the file being loaded.
    Period,
    /// When the file was mapped.
    LoadTimestamp,
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub target: String,
    pub source: ColumnSource,
    pub column_type: ColumnType,
    pub boolean_fallback: BooleanFallback,
}

impl ColumnMapping {
    pub fn field(target: impl Into<String>, column_type: ColumnType) -> Self {
        let target = target.into();
        Self {
            source: ColumnSource::Field(target.clone()),
            target,
            column_type,
            boolean_fallback: BooleanFallback::Null,
        }
    }

    pub fn synthesized(
        target: impl Into<String>,
        source: ColumnSource,
        column_type: ColumnType,
    ) -> Self {
        Self {
            target: target.into(),
            source,
            column_type,
            boolean_fallback: BooleanFallback::Null,
        }
    }

    pub fn with_boolean_fallback(mut self, fallback: BooleanFallback) -> Self {
        self.boolean_fallback = fallback;
        self
    }

    pub fn column_def(&self) -> ColumnDef {
        ColumnDef::new(self.target.clone(), self.column_type)
    }

    pub fn is_synthesized(&self) -> bool {
        !matches!(self.source, ColumnSource::Field(_))
    }
}

/// Drops synthesized mappings whose target is not among the `live` table
/// columns. Field mappings are always kept.
pub fn fit_to_table(mappings: Vec<ColumnMapping>, live: &[String]) -> Vec<ColumnMapping> {
    mappings
        .into_iter()
        .filter(|mapping| {
            let keep = !mapping.is_synthesized() || has_column(live, &mapping.target);
            if !keep {
                info!("Table has no '{}' column; not populating it", mapping.target);
            }
            keep
        })
        .collect()
}

pub struct RowMapper {
    mappings: Vec<ColumnMapping>,
    period: String,
    loaded_at: NaiveDateTime,
}

impl RowMapper {
    pub fn new(mappings: Vec<ColumnMapping>, period: impl Into<String>, loaded_at: NaiveDateTime) -> Self {
        Self {
            mappings,
            period: period.into(),
            loaded_at,
        }
    }

    pub fn target_columns(&self) -> Vec<String> {
        self.mappings.iter().map(|m| m.target.clone()).collect()
    }

    pub fn map_record(&self, record: &Record) -> Row {
        self.mappings
            .iter()
            .map(|mapping| match &mapping.source {
                ColumnSource::Field(name) => {
                    let raw = record.get(name).or_else(|| record.get_ignore_case(name));
                    coerce_value(raw.flatten(), mapping.column_type, mapping.boolean_fallback)
                }
                ColumnSource::Period => Some(Value::Text(self.period.clone())),
                ColumnSource::LoadTimestamp => Some(Value::Timestamp(self.loaded_at)),
                ColumnSource::Literal(text) => Some(Value::Text(text.clone())),
            })
            .collect()
    }

    pub fn map_records(&self, records: &[Record]) -> Vec<Row> {
        records.iter().map(|record| self.map_record(record)).collect()
    }
}
