use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while declaring or loading sync mappings.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mapping file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid identifier {name:?} in mapping for {table}")]
    InvalidIdentifier { table: String, name: String },

    #[error("mapping for {table} has no columns")]
    NoColumns { table: String },

    #[error("mapping for {table} has no primary key")]
    NoPrimaryKey { table: String },

    #[error("duplicate {side} column {column:?} in mapping for {table}")]
    DuplicateColumn {
        table: String,
        side: &'static str,
        column: String,
    },

    #[error("primary key column {column:?} is not a mapped local column of {table}")]
    UnmappedKey { table: String, column: String },

    #[error("mapping set is empty")]
    EmptySet,
}

pub type Result<T> = std::result::Result<T, MappingError>;
