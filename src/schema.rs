//! Destination table reconciliation.
//!
//! Before any row is written the pipeline makes sure the destination table is
//! fit to receive it. How that happens depends on the [`SchemaMode`]:
//!
//! - **CreateIfMissing** creates the table from the mapped column list when it
//!   does not exist yet, and trusts an existing table as-is.
//! - **ValidateOnly** never creates anything. The multi-year table carries a
//!   composite key and is provisioned outside this tool, so a missing table or
//!   a missing required column is an error.
//!
//! Either way the store is asked at least one metadata question first. The
//! column set found (or created) here is what the rest of the run works with;
//! the table is never altered afterwards.

use anyhow::Result;
use log::{debug, info};

use crate::{
    error::LoadError,
    store::{ColumnDef, Store},
};

pub const CONCEPT_ID_COLUMN: &str = "SNOMED_Concept_ID";
pub const DESCRIPTION_COLUMN: &str = "Description";
pub const USAGE_COLUMN: &str = "Usage";
pub const ACTIVE_AT_START_COLUMN: &str = "Active_at_Start";
pub const ACTIVE_AT_END_COLUMN: &str = "Active_at_End";
pub const PERIOD_COLUMN: &str = "Data_Period";
pub const CREATED_DATE_COLUMN: &str = "Created_Date";
pub const GEOGRAPHY_COLUMN: &str = "Geographic_Coverage";

/// Columns a pre-provisioned multi-year table must have.
pub const REQUIRED_COLUMNS: &[&str] = &[
    CONCEPT_ID_COLUMN,
    DESCRIPTION_COLUMN,
    USAGE_COLUMN,
    ACTIVE_AT_START_COLUMN,
    ACTIVE_AT_END_COLUMN,
    PERIOD_COLUMN,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    CreateIfMissing,
    ValidateOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Created { columns: Vec<String> },
    Existing { columns: Vec<String> },
    Validated { columns: Vec<String> },
}

impl Reconciliation {
    pub fn columns(&self) -> &[String] {
        match self {
            Reconciliation::Created { columns }
            | Reconciliation::Existing { columns }
            | Reconciliation::Validated { columns } => columns,
        }
    }
}

pub fn reconcile<S: Store + ?Sized>(
    store: &mut S,
    table: &str,
    mode: SchemaMode,
    definition: &[ColumnDef],
) -> Result<Reconciliation> {
    debug!("Checking if table '{table}' exists");
    let exists = store.table_exists(table)?;
    match (mode, exists) {
        (SchemaMode::CreateIfMissing, false) => {
            info!(
                "Table '{table}' does not exist; creating it with {} column(s)",
                definition.len()
            );
            store.create_table(table, definition)?;
            Ok(Reconciliation::Created {
                columns: store.column_names(table)?,
            })
        }
        (SchemaMode::CreateIfMissing, true) => {
            info!("Table '{table}' already exists");
            Ok(Reconciliation::Existing {
                columns: store.column_names(table)?,
            })
        }
        (SchemaMode::ValidateOnly, false) => Err(LoadError::TableMissing {
            table: table.to_string(),
        }
        .into()),
        (SchemaMode::ValidateOnly, true) => {
            let columns = store.column_names(table)?;
            let missing = missing_columns(&columns, REQUIRED_COLUMNS);
            if !missing.is_empty() {
                return Err(LoadError::SchemaMismatch {
                    table: table.to_string(),
                    missing,
                }
                .into());
            }
            info!("Table '{table}' has all required columns");
            Ok(Reconciliation::Validated { columns })
        }
    }
}

/// Required names with no case-insensitive match in `live`.
pub fn missing_columns(live: &[String], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !has_column(live, name))
        .map(|name| name.to_string())
        .collect()
}

pub fn has_column(live: &[String], name: &str) -> bool {
    live.iter().any(|column| column.eq_ignore_ascii_case(name))
}
