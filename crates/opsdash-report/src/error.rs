use opsdash_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report data: {0}")]
    Store(#[from] StoreError),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unexpected value in column {column}")]
    Column { column: &'static str },
}
