//! Row trait and cell values.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single cell value as seen by the grid.
///
/// Rows are opaque to the grid beyond their id and the values addressable by
/// column key. Everything the pipeline does (search, filter, sort) goes
/// through the stringified form, so the variants only need to cover what a
/// host row can hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Missing or undefined field.
    #[default]
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Whether this value is missing.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Display form used for search, filtering, sorting and CSV export.
    ///
    /// Missing values stringify to the empty string. Integral numbers are
    /// printed without a fractional part.
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            Value::String(s) => CellValue::Text(s.clone()),
            // Nested structures are shown the way they serialize.
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Trait for items that can be displayed as rows in a grid.
///
/// # Examples
///
/// ```ignore
/// impl GridRow for Shortcut {
///     fn id(&self) -> String { self.id.to_string() }
///
///     fn field(&self, key: &str) -> CellValue {
///         match key {
///             "shortcut" => self.shortcut.as_str().into(),
///             "command" => self.command.as_str().into(),
///             _ => CellValue::Null,
///         }
///     }
/// }
/// ```
pub trait GridRow: Clone + Send + Sync + 'static {
    /// Unique identifier for this row.
    ///
    /// Used for stable selection across dataset reloads.
    fn id(&self) -> String;

    /// Value of the field addressed by a column key.
    ///
    /// Returns [`CellValue::Null`] for fields the row does not have.
    fn field(&self, key: &str) -> CellValue;
}

/// A row backed by a JSON object.
///
/// This is the row shape produced by [`crate::transfer::import_json`] and the
/// easiest way for a host to feed REST payloads straight into a grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the record for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a raw field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl GridRow for Record {
    fn id(&self) -> String {
        match self.0.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    fn field(&self, key: &str) -> CellValue {
        self.0.get(key).map(CellValue::from).unwrap_or_default()
    }
}
