use std::collections::BTreeMap;
use std::time::Duration;

use opsdash_model::{JobKind, JobRecord};
use opsdash_store::{LocalStore, StoreError};

/// A scheduled job as the scheduler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub id: i64,
    pub name: String,
    /// Stored kind name; may be one this build does not know.
    pub kind: String,
    pub interval: Duration,
    pub enabled: bool,
}

impl JobSpec {
    pub fn job_kind(&self) -> Option<JobKind> {
        JobKind::parse(&self.kind)
    }
}

impl From<&JobRecord> for JobSpec {
    fn from(record: &JobRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            kind: record.kind.clone(),
            interval: Duration::from_secs(u64::from(record.interval_minutes) * 60),
            enabled: record.enabled,
        }
    }
}

/// Jobs keyed by id.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: BTreeMap<i64, JobSpec>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the enabled jobs of a store.
    pub fn from_store(store: &LocalStore) -> Result<Self, StoreError> {
        let mut registry = Self::new();
        for record in store.enabled_jobs()? {
            registry.insert(JobSpec::from(&record));
        }
        Ok(registry)
    }

    /// Adds or replaces a job.
    pub fn insert(&mut self, spec: JobSpec) {
        self.jobs.insert(spec.id, spec);
    }

    pub fn get(&self, id: i64) -> Option<&JobSpec> {
        self.jobs.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobSpec> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
