//! Shared types for the operations dashboard.
//!
//! - **value**: remote (source-native) and local (SQLite storage class) values
//! - **mapping**: declarative remote table → local table mappings
//! - **outcome**: per-table sync results
//! - **job**: scheduler job records and run outcomes
//! - **config**: Sage connection settings and first-time setup input

pub mod config;
pub mod error;
pub mod job;
pub mod mapping;
pub mod outcome;
pub mod value;

pub use config::{SageConfig, SetupConfig};
pub use error::{MappingError, Result};
pub use job::{JobKind, JobRecord, JobRun, JobStatus};
pub use mapping::{ColumnPair, MappingSet, SyncMapping, is_identifier};
pub use outcome::{FailureKind, SyncFailure, SyncResult, SyncStatus};
pub use value::{LocalRow, LocalValue, RemoteRow, RemoteValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_result_counts() {
        let ok = SyncResult::success("AR_Customer", "Customer", 2);
        assert!(ok.is_success());
        assert_eq!(ok.rows_fetched, 2);
        assert_eq!(ok.rows_written, 2);
        assert!(ok.error_message().is_none());

        let failed = SyncResult::failure(
            "AR_Customer",
            "Customer",
            FailureKind::LocalWrite,
            "UNIQUE constraint failed",
            2,
        );
        assert!(!failed.is_success());
        assert_eq!(failed.rows_written, 0);
        assert_eq!(
            failed.error_message().as_deref(),
            Some("local write failed: UNIQUE constraint failed")
        );
    }

    #[test]
    fn sync_result_serializes() {
        let result = SyncResult::failure(
            "AR_Customer",
            "Customer",
            FailureKind::RemoteFetch,
            "table not found",
            0,
        );
        let json = serde_json::to_string(&result).expect("serialize result");
        let round: SyncResult = serde_json::from_str(&json).expect("deserialize result");
        assert_eq!(round, result);
    }
}
