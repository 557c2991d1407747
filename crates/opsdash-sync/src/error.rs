use opsdash_source::SourceError;
use opsdash_store::StoreError;
use thiserror::Error;

/// A sync run that could not start.
///
/// Per-table failures are not errors; they are reported in the run's results.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local store could not be opened or its Sage settings are missing.
    #[error("local store: {0}")]
    Store(#[from] StoreError),

    /// The remote connection could not be opened.
    #[error("remote connection: {0}")]
    Connection(#[from] SourceError),
}
