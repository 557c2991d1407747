//! ODBC implementation of the remote source.
//!
//! Every column is fetched through a text row set and then classified by the
//! ODBC data type the driver reports for it, so decimals keep their exact
//! digits and dates arrive as calendar values rather than driver strings.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use odbc_api::buffers::TextRowSet;
use odbc_api::{Connection, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata};
use tracing::{debug, trace};

use opsdash_model::{RemoteRow, RemoteValue, SageConfig};

use crate::error::SourceError;
use crate::{RemoteSource, SourceConnector};

/// Rows fetched per round trip.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Upper bound for a single text cell, in bytes.
pub const DEFAULT_MAX_TEXT_LEN: usize = 4096;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

fn environment() -> Result<&'static Environment, odbc_api::Error> {
    if let Some(environment) = ENVIRONMENT.get() {
        return Ok(environment);
    }
    let environment = Environment::new()?;
    Ok(ENVIRONMENT.get_or_init(|| environment))
}

/// Builds the driver connection string for a Sage 100 company.
pub fn connection_string(config: &SageConfig) -> String {
    format!(
        "DSN={};UID={};PWD={};Company={}",
        attribute(&config.dsn),
        attribute(&config.username),
        attribute(&config.password),
        attribute(&config.company_code)
    )
}

/// Quotes an attribute value when it holds characters with meaning in a
/// connection string.
fn attribute(value: &str) -> String {
    if value.contains([';', '{', '}', '=']) || value.trim() != value {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}

/// How a result column is turned into a [`RemoteValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Decimal,
    Date,
    Timestamp,
    Bool,
}

impl ColumnKind {
    pub fn from_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::Decimal { .. } | DataType::Numeric { .. } => Self::Decimal,
            DataType::Integer | DataType::SmallInt | DataType::BigInt | DataType::TinyInt => {
                Self::Integer
            }
            DataType::Float { .. } | DataType::Real | DataType::Double => Self::Float,
            DataType::Date => Self::Date,
            DataType::Timestamp { .. } => Self::Timestamp,
            DataType::Bit => Self::Bool,
            _ => Self::Text,
        }
    }
}

/// Interprets one fetched text cell. `None` is SQL NULL.
///
/// Values the driver renders in an unexpected shape are kept as text rather
/// than dropped.
pub fn parse_cell(kind: ColumnKind, cell: Option<&[u8]>) -> RemoteValue {
    let Some(bytes) = cell else {
        return RemoteValue::Null;
    };
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    let parsed = match kind {
        ColumnKind::Text => None,
        ColumnKind::Integer => trimmed.parse().ok().map(RemoteValue::Integer),
        ColumnKind::Float => trimmed.parse().ok().map(RemoteValue::Float),
        ColumnKind::Decimal => (!trimmed.is_empty() && trimmed.parse::<f64>().is_ok())
            .then(|| RemoteValue::Decimal(trimmed.to_string())),
        ColumnKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(RemoteValue::Date),
        ColumnKind::Timestamp => parse_timestamp(trimmed).map(RemoteValue::Timestamp),
        ColumnKind::Bool => match trimmed {
            "1" | "true" | "TRUE" => Some(RemoteValue::Bool(true)),
            "0" | "false" | "FALSE" => Some(RemoteValue::Bool(false)),
            _ => None,
        },
    };
    parsed.unwrap_or_else(|| RemoteValue::Text(text.to_string()))
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Opens [`OdbcSource`]s through the system driver manager.
#[derive(Debug, Clone, Copy)]
pub struct OdbcConnector {
    pub batch_size: usize,
    pub max_text_len: usize,
}

impl Default for OdbcConnector {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
        }
    }
}

impl SourceConnector for OdbcConnector {
    fn connect(&self, config: &SageConfig) -> Result<Box<dyn RemoteSource>, SourceError> {
        let source = OdbcSource::connect(config, self.batch_size, self.max_text_len)?;
        Ok(Box::new(source))
    }
}

/// A connection to Sage 100 used only for `SELECT`s.
pub struct OdbcSource {
    conn: Connection<'static>,
    batch_size: usize,
    max_text_len: usize,
}

impl OdbcSource {
    pub fn connect(
        config: &SageConfig,
        batch_size: usize,
        max_text_len: usize,
    ) -> Result<Self, SourceError> {
        let connect_error = |error: odbc_api::Error| SourceError::Connect {
            dsn: config.dsn.clone(),
            message: error.to_string(),
        };
        debug!(
            dsn = %config.dsn,
            company = %config.company_code,
            user = %config.username,
            "connecting to Sage 100"
        );
        let conn = environment()
            .map_err(connect_error)?
            .connect_with_connection_string(
                &connection_string(config),
                ConnectionOptions::default(),
            )
            .map_err(connect_error)?;
        debug!(dsn = %config.dsn, "connected to Sage 100");
        Ok(Self {
            conn,
            batch_size: batch_size.max(1),
            max_text_len,
        })
    }
}

fn fetch_error(error: odbc_api::Error) -> SourceError {
    SourceError::fetch(error.to_string())
}

impl RemoteSource for OdbcSource {
    fn fetch_all(&mut self, sql: &str) -> Result<Vec<RemoteRow>, SourceError> {
        let Some(mut cursor) = self.conn.execute(sql, (), None).map_err(fetch_error)? else {
            return Ok(Vec::new());
        };
        let column_count = cursor.num_result_cols().map_err(fetch_error)?;
        let mut kinds = Vec::new();
        for column in 1..=column_count {
            let column = u16::try_from(column).map_err(|_| SourceError::fetch("bad column index"))?;
            let data_type = cursor.col_data_type(column).map_err(fetch_error)?;
            kinds.push(ColumnKind::from_data_type(data_type));
        }
        trace!(?kinds, "result columns");

        let mut buffers =
            TextRowSet::for_cursor(self.batch_size, &mut cursor, Some(self.max_text_len))
                .map_err(fetch_error)?;
        let mut row_set_cursor = cursor.bind_buffer(&mut buffers).map_err(fetch_error)?;
        let mut rows = Vec::new();
        while let Some(batch) = row_set_cursor.fetch().map_err(fetch_error)? {
            for row_index in 0..batch.num_rows() {
                let row = kinds
                    .iter()
                    .enumerate()
                    .map(|(column, kind)| parse_cell(*kind, batch.at(column, row_index)))
                    .collect();
                rows.push(row);
            }
        }
        Ok(rows)
    }
}
