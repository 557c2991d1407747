//! Scheduler job records as stored in `scheduler_jobs`.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// What a scheduled job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Pull the Sage 100 tables into the local store.
    SageSync,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SageSync => "sage_sync",
        }
    }

    /// Parses a stored job kind. The legacy script name is accepted too.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "sage_sync" | "pull_sage" | "pull_sage.py" => Some(Self::SageSync),
            _ => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Every mapping synced.
    Success,
    /// The run stopped on a failed mapping.
    Failure,
    /// The run could not start (connection, configuration, unknown job).
    Error,
    /// The run exceeded the scheduler's wall-clock limit.
    Timeout,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `scheduler_jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub interval_minutes: u32,
    pub enabled: bool,
    pub last_run: Option<String>,
    pub last_status: Option<String>,
    pub last_run_log: Option<String>,
}

/// Outcome of one job execution, written back to `scheduler_jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRun {
    pub ran_at: DateTime<Utc>,
    pub status: JobStatus,
    pub log: String,
}

impl JobRun {
    pub fn new(status: JobStatus, log: impl Into<String>) -> Self {
        Self {
            ran_at: Utc::now(),
            status,
            log: log.into(),
        }
    }

    pub fn ran_at_rfc3339(&self) -> String {
        self.ran_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
