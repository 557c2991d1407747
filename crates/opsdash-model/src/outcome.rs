use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failure,
}

/// Which side of the sync failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The remote `SELECT` failed; the local table was not touched.
    RemoteFetch,
    /// The local upsert failed and was rolled back.
    LocalWrite,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteFetch => write!(f, "remote fetch failed"),
            Self::LocalWrite => write!(f, "local write failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of syncing one mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub remote_table: String,
    pub table: String,
    pub rows_fetched: usize,
    pub rows_written: usize,
    pub status: SyncStatus,
    pub failure: Option<SyncFailure>,
}

impl SyncResult {
    pub fn success(remote_table: &str, table: &str, rows: usize) -> Self {
        Self {
            remote_table: remote_table.to_string(),
            table: table.to_string(),
            rows_fetched: rows,
            rows_written: rows,
            status: SyncStatus::Success,
            failure: None,
        }
    }

    /// A failed table. Nothing is written on failure, so `rows_written` is 0.
    pub fn failure(
        remote_table: &str,
        table: &str,
        kind: FailureKind,
        message: impl Into<String>,
        rows_fetched: usize,
    ) -> Self {
        Self {
            remote_table: remote_table.to_string(),
            table: table.to_string(),
            rows_fetched,
            rows_written: 0,
            status: SyncStatus::Failure,
            failure: Some(SyncFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|failure| failure.kind)
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}
