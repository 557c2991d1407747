//! The `scheduler_jobs` table.

use rusqlite::{Row, params};

use opsdash_model::{JobKind, JobRecord, JobRun};

use crate::error::StoreError;
use crate::store::LocalStore;

const JOB_COLUMNS: &str = "id, job_name, job_kind, interval_minutes, enabled, \
                           last_run, last_status, last_run_log";

impl LocalStore {
    pub fn jobs(&self) -> Result<Vec<JobRecord>, StoreError> {
        self.select_jobs(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduler_jobs ORDER BY id"
        ))
    }

    pub fn enabled_jobs(&self) -> Result<Vec<JobRecord>, StoreError> {
        self.select_jobs(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduler_jobs WHERE enabled = 1 ORDER BY id"
        ))
    }

    pub fn job(&self, id: i64) -> Result<JobRecord, StoreError> {
        self.select_jobs(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduler_jobs WHERE id = {id}"
        ))?
        .into_iter()
        .next()
        .ok_or(StoreError::UnknownJob { id })
    }

    /// Registers a job and returns its id.
    pub fn add_job(
        &self,
        name: &str,
        kind: JobKind,
        interval_minutes: u32,
        enabled: bool,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO scheduler_jobs (job_name, job_kind, interval_minutes, enabled)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, kind.as_str(), interval_minutes, enabled],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Stores the outcome of a job run as the job's last-run record.
    pub fn record_job_run(&self, id: i64, run: &JobRun) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE scheduler_jobs SET last_run = ?1, last_status = ?2, last_run_log = ?3
             WHERE id = ?4",
            params![run.ran_at_rfc3339(), run.status.as_str(), run.log, id],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownJob { id });
        }
        Ok(())
    }

    fn select_jobs(&self, sql: &str) -> Result<Vec<JobRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], job_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        interval_minutes: row.get(3)?,
        enabled: row.get(4)?,
        last_run: row.get(5)?,
        last_status: row.get(6)?,
        last_run_log: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use opsdash_model::JobStatus;

    use super::*;

    #[test]
    fn records_last_run() {
        let store = LocalStore::open_in_memory().unwrap();
        let id = store
            .add_job("Sync Sage 100 Data", JobKind::SageSync, 60, true)
            .unwrap();
        store
            .add_job("Disabled", JobKind::SageSync, 60, false)
            .unwrap();
        assert_eq!(store.jobs().unwrap().len(), 2);
        assert_eq!(store.enabled_jobs().unwrap().len(), 1);

        let run = JobRun::new(JobStatus::Success, "Customer: 2 fetched, 2 written");
        store.record_job_run(id, &run).unwrap();
        let job = store.job(id).unwrap();
        assert_eq!(job.last_status.as_deref(), Some("success"));
        assert_eq!(job.last_run, Some(run.ran_at_rfc3339()));
        assert_eq!(
            job.last_run_log.as_deref(),
            Some("Customer: 2 fetched, 2 written")
        );
        assert_eq!(job.interval_minutes, 60);
        assert!(job.enabled);
    }

    #[test]
    fn unknown_job() {
        let store = LocalStore::open_in_memory().unwrap();
        let run = JobRun::new(JobStatus::Error, "");
        assert!(matches!(
            store.record_job_run(42, &run),
            Err(StoreError::UnknownJob { id: 42 })
        ));
        assert!(matches!(
            store.job(42),
            Err(StoreError::UnknownJob { id: 42 })
        ));
    }
}
