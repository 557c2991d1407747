//! Interval execution of registered jobs.
//!
//! Every job gets its own task that ticks on the job's interval. A run is
//! executed on the blocking pool and awaited before the next tick. A run that
//! exceeds the job timeout is recorded as `timeout` and its blocking thread is
//! left to finish on its own; until it does, further runs of that job are
//! skipped and recorded as `error`, so one job never syncs twice at once.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, error, info, info_span, warn};

use opsdash_model::{JobKind, JobRun, JobStatus, MappingSet};
use opsdash_source::SourceConnector;
use opsdash_store::{LocalStore, Passphrase, StoreError};
use opsdash_sync::run_sage_sync;

use crate::error::SchedulerError;
use crate::registry::{JobRegistry, JobSpec};

pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_FIRST_RUN_DELAY: Duration = Duration::from_secs(10);

const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// The encrypted store the jobs sync into and record their runs in.
    pub store_path: PathBuf,
    /// Wall-clock limit of a single run.
    pub job_timeout: Duration,
    /// Delay between `start` and the first run of each job.
    pub first_run_delay: Duration,
}

impl SchedulerConfig {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            job_timeout: DEFAULT_JOB_TIMEOUT,
            first_run_delay: DEFAULT_FIRST_RUN_DELAY,
        }
    }
}

/// Everything a job run needs, shared by all job tasks.
struct JobContext {
    config: SchedulerConfig,
    connector: Arc<dyn SourceConnector>,
    mappings: Arc<MappingSet>,
    passphrase: Arc<Passphrase>,
    /// Jobs whose sync is still on the blocking pool.
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

/// Marks a job as in flight until dropped, even if the run panics.
struct InFlight {
    jobs: Arc<Mutex<HashSet<i64>>>,
    job_id: i64,
}

impl InFlight {
    fn claim(jobs: &Arc<Mutex<HashSet<i64>>>, job_id: i64) -> Option<Self> {
        let claimed = jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id);
        claimed.then(|| Self {
            jobs: Arc::clone(jobs),
            job_id,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.job_id);
    }
}

impl JobContext {
    /// Runs a job once and records the outcome.
    async fn run_and_record(&self, spec: &JobSpec) -> Result<JobRun, SchedulerError> {
        let span = info_span!("job", job_id = spec.id, name = %spec.name);
        async {
            let run = self.execute(spec).await;
            match run.status {
                JobStatus::Success => info!(status = %run.status, "job finished"),
                _ => warn!(status = %run.status, log = %run.log, "job finished"),
            }
            self.record(spec.id, &run).await?;
            Ok(run)
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, spec: &JobSpec) -> JobRun {
        match spec.job_kind() {
            Some(JobKind::SageSync) => self.sage_sync(spec.id).await,
            None => JobRun::new(
                JobStatus::Error,
                format!("unknown job kind {:?}", spec.kind),
            ),
        }
    }

    async fn sage_sync(&self, job_id: i64) -> JobRun {
        let Some(in_flight) = InFlight::claim(&self.in_flight, job_id) else {
            return JobRun::new(
                JobStatus::Error,
                "skipped: the previous run of this job is still in progress",
            );
        };
        let store_path = self.config.store_path.clone();
        let passphrase = Arc::clone(&self.passphrase);
        let connector = Arc::clone(&self.connector);
        let mappings = Arc::clone(&self.mappings);
        let task = tokio::task::spawn_blocking(move || {
            let _in_flight = in_flight;
            run_sage_sync(&store_path, &passphrase, connector.as_ref(), &mappings)
        });

        match tokio::time::timeout(self.config.job_timeout, task).await {
            Err(_) => JobRun::new(
                JobStatus::Timeout,
                format!(
                    "sync did not finish within {}s",
                    self.config.job_timeout.as_secs()
                ),
            ),
            Ok(Err(join_error)) => {
                JobRun::new(JobStatus::Error, format!("sync task failed: {join_error}"))
            }
            Ok(Ok(Err(sync_error))) => JobRun::new(JobStatus::Error, sync_error.to_string()),
            Ok(Ok(Ok(run))) => {
                let status = if run.succeeded() {
                    JobStatus::Success
                } else {
                    JobStatus::Failure
                };
                JobRun::new(status, run.log())
            }
        }
    }

    async fn record(&self, job_id: i64, run: &JobRun) -> Result<(), SchedulerError> {
        let store_path = self.config.store_path.clone();
        let passphrase = Arc::clone(&self.passphrase);
        let run = run.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let store = LocalStore::open(&store_path, &passphrase)?;
            store.record_job_run(job_id, &run)?;
            store.close()
        })
        .await??;
        Ok(())
    }
}

/// Owns the job registry and the tasks running it.
pub struct Scheduler {
    context: Arc<JobContext>,
    registry: JobRegistry,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        registry: JobRegistry,
        connector: Arc<dyn SourceConnector>,
        mappings: MappingSet,
        passphrase: Arc<Passphrase>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            context: Arc::new(JobContext {
                config,
                connector,
                mappings: Arc::new(mappings),
                in_flight: Arc::default(),
                passphrase,
            }),
            registry,
            shutdown,
            tasks: Vec::new(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Spawns one task per enabled job and returns how many were started.
    ///
    /// Must be called from inside a Tokio runtime. Calling it on a running
    /// scheduler does nothing.
    pub fn start(&mut self) -> usize {
        if self.is_running() {
            return 0;
        }
        self.shutdown.send_replace(false);
        for spec in self.registry.iter().filter(|spec| spec.enabled) {
            info!(
                job_id = spec.id,
                name = %spec.name,
                interval_minutes = spec.interval.as_secs() / 60,
                "scheduling job"
            );
            let task = tokio::spawn(job_loop(
                Arc::clone(&self.context),
                spec.clone(),
                self.shutdown.subscribe(),
            ));
            self.tasks.push(task);
        }
        info!(jobs = self.tasks.len(), "scheduler started");
        self.tasks.len()
    }

    /// Signals every job task to stop and waits for them.
    ///
    /// A run in progress is allowed to finish (or time out) first.
    pub async fn stop(&mut self) {
        self.shutdown.send_replace(true);
        for task in self.tasks.drain(..) {
            if let Err(join_error) = task.await {
                error!(%join_error, "job task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }

    /// Runs a registered job immediately, outside its schedule.
    pub async fn run_now(&self, job_id: i64) -> Result<JobRun, SchedulerError> {
        let spec = self
            .registry
            .get(job_id)
            .ok_or(SchedulerError::UnknownJob { id: job_id })?;
        self.context.run_and_record(spec).await
    }
}

async fn job_loop(context: Arc<JobContext>, spec: JobSpec, mut shutdown: watch::Receiver<bool>) {
    let start = Instant::now() + context.config.first_run_delay;
    let mut ticker = tokio::time::interval_at(start, spec.interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(error) = context.run_and_record(&spec).await {
                    error!(job_id = spec.id, %error, "job run could not be recorded");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
