//! A complete sync run against the configured Sage company.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use opsdash_model::{MappingSet, SyncResult};
use opsdash_source::SourceConnector;
use opsdash_store::{LocalStore, Passphrase};

use crate::engine::run_sync;
use crate::error::SyncError;

/// The ordered results of one run, with its wall-clock bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<SyncResult>,
}

impl SyncRun {
    /// True when every attempted table synced.
    pub fn succeeded(&self) -> bool {
        self.results.iter().all(SyncResult::is_success)
    }

    pub fn rows_written(&self) -> usize {
        self.results.iter().map(|result| result.rows_written).sum()
    }

    /// The failed table, if the run stopped early.
    pub fn failure(&self) -> Option<&SyncResult> {
        self.results.iter().find(|result| !result.is_success())
    }

    /// One line per attempted table, for the job's last-run log.
    pub fn log(&self) -> String {
        let mut log = String::new();
        for result in &self.results {
            match result.error_message() {
                None => {
                    let _ = writeln!(
                        log,
                        "{}: {} fetched, {} written",
                        result.table, result.rows_fetched, result.rows_written
                    );
                }
                Some(message) => {
                    let _ = writeln!(log, "{}: FAILED ({message})", result.table);
                }
            }
        }
        let seconds = (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        let _ = write!(
            log,
            "{} of {} tables synced in {seconds:.1}s",
            self.results.iter().filter(|result| result.is_success()).count(),
            self.results.len()
        );
        log
    }
}

/// Opens the store at `store_path`, connects to Sage with the settings held
/// in it, and syncs `mappings` in order.
///
/// # Errors
///
/// [`SyncError::Store`] when the store cannot be unlocked or lacks Sage
/// settings, [`SyncError::Connection`] when the remote connection fails. In
/// both cases no table has been touched.
pub fn run_sage_sync(
    store_path: &Path,
    passphrase: &Passphrase,
    connector: &dyn SourceConnector,
    mappings: &MappingSet,
) -> Result<SyncRun, SyncError> {
    let started_at = Utc::now();
    let mut local = LocalStore::open(store_path, passphrase)?;
    let config = local.sage_config()?;
    let mut remote = connector.connect(&config)?;

    let results = run_sync(remote.as_mut(), &mut local, mappings.as_slice());
    let run = SyncRun {
        started_at,
        finished_at: Utc::now(),
        results,
    };
    drop(remote);
    if let Err(error) = local.close() {
        warn!(%error, "closing the local store failed");
    }
    info!(
        succeeded = run.succeeded(),
        tables = run.results.len(),
        rows = run.rows_written(),
        "sync run finished"
    );
    Ok(run)
}
