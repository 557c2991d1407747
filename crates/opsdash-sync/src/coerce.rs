//! Conversion of remote values into local storage values.
//!
//! Each value is converted on its own; a row keeps its width and order.

use chrono::NaiveDateTime;

use opsdash_model::{LocalRow, LocalValue, RemoteRow, RemoteValue};

/// Format of coerced dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format of coerced timestamps. The fraction is omitted when it is zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Converts one remote value into its local form.
///
/// - decimals become `Real`, parsed from the exact decimal text
/// - dates become `YYYY-MM-DD` text, timestamps ISO-8601 text
/// - booleans become 0 or 1
/// - everything else passes through unchanged
pub fn coerce_value(value: RemoteValue) -> LocalValue {
    match value {
        RemoteValue::Null => LocalValue::Null,
        RemoteValue::Bool(flag) => LocalValue::Integer(i64::from(flag)),
        RemoteValue::Integer(number) => LocalValue::Integer(number),
        RemoteValue::Float(number) => LocalValue::Real(number),
        RemoteValue::Decimal(text) => match text.trim().parse::<f64>() {
            Ok(number) => LocalValue::Real(number),
            Err(_) => LocalValue::Text(text),
        },
        RemoteValue::Date(date) => LocalValue::Text(date.format(DATE_FORMAT).to_string()),
        RemoteValue::Timestamp(timestamp) => LocalValue::Text(format_timestamp(&timestamp)),
        RemoteValue::Text(text) => LocalValue::Text(text),
    }
}

pub fn coerce_row(row: RemoteRow) -> LocalRow {
    row.into_iter().map(coerce_value).collect()
}

fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
