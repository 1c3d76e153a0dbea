//! Dataset import and export.
//!
//! Exports always cover the full dataset, not the filtered view. Imports are
//! all-or-nothing: a payload is fully validated before anything replaces the
//! current rows.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::column::ColumnRegistry;
use crate::error::{ImportError, TransferError};
use crate::row::GridRow;

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Pretty-printed JSON array of every row.
pub fn export_json<R: Serialize>(rows: &[R]) -> Result<String, TransferError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// CSV of every row over the given column order.
///
/// The first line holds the column labels. Every field is wrapped in double
/// quotes and embedded quotes are doubled. Keys unknown to the registry are
/// skipped.
pub fn export_csv<R: GridRow>(
    rows: &[R],
    registry: &ColumnRegistry<R>,
    order: &[String],
) -> String {
    let columns: Vec<_> = order.iter().filter_map(|key| registry.get(key)).collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| quote(&c.label))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            columns
                .iter()
                .map(|c| quote(&c.value(row).display()))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Download name for an export, e.g. `users-export-2026-10-16.csv`.
pub fn export_file_name(table_id: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!("{}-export-{}.{}", table_id, date.format("%Y-%m-%d"), format.extension())
}

/// Parse an import payload.
///
/// The top level must be a JSON array and every element must deserialize;
/// otherwise nothing is returned.
pub fn import_json<R: DeserializeOwned>(text: &str) -> Result<Vec<R>, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ImportError::NotAnArray {
                found: json_type(&other),
            });
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|source| ImportError::InvalidRecord { index, source })
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
