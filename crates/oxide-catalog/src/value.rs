//! Raw catalog values and their coercions.
//!
//! Catalog queries return loosely typed columns: a flag may arrive as
//! `'YES'`, `1` or `true` depending on the engine, and numeric metadata is
//! sometimes reported as text. [`CatalogValue`] keeps the raw value and the
//! accessors here convert it with a caller-supplied default.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single raw value read from a catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CatalogValue {
    /// SQL NULL.
    Null,
    /// Boolean column.
    Bool(bool),
    /// Signed integer column.
    Int(i64),
    /// Unsigned integer column (MySQL reports most catalog counters unsigned).
    UInt(u64),
    /// Floating point or decimal column.
    Float(f64),
    /// Character data.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
}

/// One catalog row keyed by the exact column alias used in the query.
pub type Row = BTreeMap<String, CatalogValue>;

impl CatalogValue {
    /// Returns `true` for SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders the value as text. NULL yields `None`.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::UInt(u) => Some(u.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Converts the value to an `i64` if it holds a number or numeric text.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            Self::UInt(u) => i64::try_from(*u).ok(),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Self::Text(s) => parse_integer(s),
            Self::Bytes(b) => parse_integer(&String::from_utf8_lossy(b)),
            _ => None,
        }
    }

    /// Converts the value to an `i32`, saturating out-of-range numbers.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64()
            .map(|v| i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX }))
    }

    /// Interprets the value as a flag. NULL yields `default`; numbers are
    /// true when non-zero; text is true for `true`, `yes`, `y` or `1`.
    #[must_use]
    pub fn as_bool(&self, default: bool) -> bool {
        match self {
            Self::Null => default,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::UInt(u) => *u != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => text_flag(s),
            Self::Bytes(b) => text_flag(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<&str> for CatalogValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CatalogValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CatalogValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for CatalogValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for CatalogValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for CatalogValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn text_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

// =============================================================================
// Row accessors
// =============================================================================

/// Reads a column as text. Missing columns and NULL yield `None`.
#[must_use]
pub fn get_string(row: &Row, key: &str) -> Option<String> {
    row.get(key).and_then(CatalogValue::as_string)
}

/// Reads a column as trimmed, lower-cased text; missing or NULL yields `""`.
#[must_use]
pub fn get_lower(row: &Row, key: &str) -> String {
    get_string(row, key)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default()
}

/// Reads a column as an `i32`, falling back to `default`.
#[must_use]
pub fn get_i32(row: &Row, key: &str, default: i32) -> i32 {
    row.get(key).and_then(CatalogValue::as_i32).unwrap_or(default)
}

/// Reads a column as an `i64`. Missing columns and NULL yield `None`.
#[must_use]
pub fn get_i64(row: &Row, key: &str) -> Option<i64> {
    row.get(key).and_then(CatalogValue::as_i64)
}

/// Reads a column as a flag, falling back to `default`.
#[must_use]
pub fn get_bool(row: &Row, key: &str, default: bool) -> bool {
    row.get(key).map_or(default, |v| v.as_bool(default))
}
