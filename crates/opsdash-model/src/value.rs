//! Row values on both sides of a sync.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A value as delivered by the remote ERP driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Arbitrary-precision decimal, kept as the driver's exact text.
    Decimal(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Text(String),
}

/// A value ready to be bound into the local SQLite store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocalValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl LocalValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Renders the value the way it appears in exports (`Null` is empty).
    pub fn display_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

impl From<&str> for LocalValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LocalValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for LocalValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for LocalValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl<T: Into<LocalValue>> From<Option<T>> for LocalValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One remote row, in the mapping's column order.
pub type RemoteRow = Vec<RemoteValue>;

/// One coerced row, in the mapping's column order.
pub type LocalRow = Vec<LocalValue>;
