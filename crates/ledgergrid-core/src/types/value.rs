//! # Cell Values and Rows
//!
//! Rows are opaque, heterogeneous key→value records owned by the row source.
//! The grid only needs `row[column.key]` to resolve, which is what
//! [`GridRecord::cell`] provides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// CELL VALUE
// =============================================================================

/// A single cell value.
///
/// Mirrors the value types a row may carry: string, number, boolean, or
/// missing. `Null` stands for both `null` and "field absent".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing or explicit null.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Any numeric value.
    Number(f64),
    /// Free text.
    Text(String),
}

impl CellValue {
    /// Create a text value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Check if the value is null/absent.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value.
    ///
    /// Numbers map to themselves; text is parsed after trimming (empty text is
    /// not a number). Booleans and nulls are never numeric.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_number(s),
            Self::Bool(_) | Self::Null => None,
        }
    }

    /// Convert a JSON value into a cell.
    ///
    /// Nested arrays and objects keep their JSON text so they still search
    /// and facet as something meaningful.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Stringification used by facets and search (`String(row[key])`).
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(f, *n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// JavaScript number formatting: exponent form outside `[1e-6, 1e21)`.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return f.write_str("NaN");
    }
    if n.is_infinite() {
        return f.write_str(if n.is_sign_positive() { "Infinity" } else { "-Infinity" });
    }
    if n == 0.0 {
        // Covers -0.
        return f.write_str("0");
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let exp = format!("{n:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                write!(f, "{mantissa}e+{power}")
            }
            _ => f.write_str(&exp),
        };
    }
    write!(f, "{n}")
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Parse a trimmed, non-empty, finite number.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

// =============================================================================
// GRID RECORD
// =============================================================================

/// Field accessor the generic grid engine is parameterized by.
///
/// Implement this for a typed entity to instantiate the grid over it;
/// [`Row`] implements it for schema-agnostic JSON data.
pub trait GridRecord {
    /// Resolve the value for a column key. Unknown keys resolve to `Null`.
    fn cell(&self, key: &str) -> CellValue;
}

// =============================================================================
// ROW
// =============================================================================

/// A schema-agnostic row: column key → cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, CellValue>);

impl Row {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Borrow a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0.get(key)
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.0.iter()
    }

    /// Build a row from a JSON object. Returns `None` for non-objects.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self(
            object
                .iter()
                .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
                .collect(),
        ))
    }
}

impl GridRecord for Row {
    fn cell(&self, key: &str) -> CellValue {
        self.0.get(key).cloned().unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
