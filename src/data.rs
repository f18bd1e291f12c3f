use std::fmt;

use chrono::NaiveDateTime;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Integer,
    Boolean,
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// What an unrecognised or null flag becomes.
///
/// Single-file typed loads keep the gap as `NULL`; the multi-year table
/// declares its flag columns `NOT NULL`, so those loads write `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BooleanFallback {
    #[default]
    Null,
    False,
}

/// Parses a usage count. Never fails: null and unparseable input give `0`.
pub fn coerce_integer(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if ["true", "1", "yes"]
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        Some(true)
    } else if ["false", "0", "no"]
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        Some(false)
    } else {
        None
    }
}

pub fn coerce_boolean(raw: Option<&str>, fallback: BooleanFallback) -> Option<bool> {
    match raw.and_then(parse_boolean) {
        Some(flag) => Some(flag),
        None => match fallback {
            BooleanFallback::Null => None,
            BooleanFallback::False => Some(false),
        },
    }
}

/// Converts a raw cell into the destination type of its column.
///
/// Timestamps are only ever synthesized, so a raw timestamp cell is kept as
/// text and left to the store.
pub fn coerce_value(
    raw: Option<&str>,
    ty: ColumnType,
    fallback: BooleanFallback,
) -> Option<Value> {
    match ty {
        ColumnType::Text | ColumnType::Timestamp => raw.map(|value| Value::Text(value.to_string())),
        ColumnType::Integer => Some(Value::Integer(coerce_integer(raw))),
        ColumnType::Boolean => coerce_boolean(raw, fallback).map(Value::Boolean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn coerce_integer_defaults_to_zero() {
        assert_eq!(coerce_integer(None), 0);
        assert_eq!(coerce_integer(Some("")), 0);
        assert_eq!(coerce_integer(Some("abc")), 0);
        assert_eq!(coerce_integer(Some("42")), 42);
        assert_eq!(coerce_integer(Some("-5")), -5);
        assert_eq!(coerce_integer(Some(" 17 ")), 17);
        assert_eq!(coerce_integer(Some("1.5")), 0);
    }

    #[test]
    fn boolean_tokens_are_case_insensitive() {
        assert_eq!(parse_boolean("TRUE"), Some(true));
        assert_eq!(parse_boolean("Yes"), Some(true));
        assert_eq!(parse_boolean("1"), Some(true));
        assert_eq!(parse_boolean("No"), Some(false));
        assert_eq!(parse_boolean("0"), Some(false));
        assert_eq!(parse_boolean("maybe"), None);
        assert_eq!(parse_boolean("y"), None);
    }

    #[test]
    fn boolean_fallback_differs_by_policy() {
        assert_eq!(coerce_boolean(Some("maybe"), BooleanFallback::Null), None);
        assert_eq!(
            coerce_boolean(Some("maybe"), BooleanFallback::False),
            Some(false)
        );
        assert_eq!(coerce_boolean(None, BooleanFallback::Null), None);
        assert_eq!(coerce_boolean(None, BooleanFallback::False), Some(false));
    }

    #[test]
    fn text_passes_through_untouched() {
        assert_eq!(
            coerce_value(Some(" a b "), ColumnType::Text, BooleanFallback::Null),
            Some(Value::Text(" a b ".to_string()))
        );
        assert_eq!(
            coerce_value(None, ColumnType::Text, BooleanFallback::False),
            None
        );
        assert_eq!(
            coerce_value(None, ColumnType::Integer, BooleanFallback::Null),
            Some(Value::Integer(0))
        );
    }

    #[test]
    fn timestamp_displays_in_sql_format() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-05-06 14:30:00");
    }
}
