//! Scheduler runs against an on-disk store and a fake ERP.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use opsdash_model::{JobRecord, RemoteValue, SageConfig, SetupConfig};
use opsdash_scheduler::{JobRegistry, Scheduler, SchedulerConfig, SchedulerError};
use opsdash_source::testing::{FakeConnector, FakeSource};
use opsdash_source::{RemoteSource, SourceConnector, SourceError};
use opsdash_store::{LocalStore, Passphrase};
use opsdash_sync::sage_mappings;
use tempfile::TempDir;

const MASTER: &str = "master";

struct Site {
    _dir: TempDir,
    path: PathBuf,
}

impl Site {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.db");
        let setup = SetupConfig {
            sage: SageConfig {
                dsn: "SOTAMAS90".to_string(),
                company_code: "ABC".to_string(),
                server: "sage01".to_string(),
                database: "MAS_ABC".to_string(),
                username: "reader".to_string(),
                password: "s3cret".to_string(),
            },
            sieve_defaults: Vec::new(),
            samples: Vec::new(),
        };
        LocalStore::create(&path, &Passphrase::new(MASTER).unwrap(), &setup)
            .unwrap()
            .close()
            .unwrap();
        Self { _dir: dir, path }
    }

    fn store(&self) -> LocalStore {
        LocalStore::open(&self.path, &Passphrase::new(MASTER).unwrap()).unwrap()
    }

    fn jobs(&self) -> Vec<JobRecord> {
        self.store().jobs().unwrap()
    }

    fn scheduler(&self, config: SchedulerConfig, connector: Arc<dyn SourceConnector>) -> Scheduler {
        let registry = JobRegistry::from_store(&self.store()).unwrap();
        Scheduler::new(
            config,
            registry,
            connector,
            sage_mappings().unwrap(),
            Arc::new(Passphrase::new(MASTER).unwrap()),
        )
    }
}

fn config(path: &Path) -> SchedulerConfig {
    let mut config = SchedulerConfig::new(path);
    config.first_run_delay = Duration::ZERO;
    config.job_timeout = Duration::from_secs(30);
    config
}

fn erp() -> FakeSource {
    FakeSource::new()
        .with_table(
            "AR_Customer",
            vec![
                vec![
                    RemoteValue::Text("C1".to_string()),
                    RemoteValue::Text("Acme".to_string()),
                ],
                vec![
                    RemoteValue::Text("C2".to_string()),
                    RemoteValue::Text("Beta".to_string()),
                ],
            ],
        )
        .with_table("AR_InvoiceHistoryHeader", Vec::new())
        .with_table("AR_InvoiceHistoryDetail", Vec::new())
        .with_table("CI_Item", Vec::new())
}

#[tokio::test]
async fn run_now_records_success() {
    let site = Site::new();
    let scheduler = site.scheduler(
        config(&site.path),
        Arc::new(FakeConnector::new(erp())),
    );
    let job_id = site.jobs()[0].id;

    let run = scheduler.run_now(job_id).await.unwrap();
    assert_eq!(run.status.as_str(), "success");

    let job = &site.jobs()[0];
    assert_eq!(job.last_status.as_deref(), Some("success"));
    assert_eq!(job.last_run.as_deref(), Some(run.ran_at_rfc3339().as_str()));
    let log = job.last_run_log.as_deref().unwrap();
    assert!(log.starts_with("Customer: 2 fetched, 2 written\n"), "{log}");
    assert_eq!(site.store().row_count("Customer").unwrap(), 2);
}

#[tokio::test]
async fn failed_table_is_recorded_as_failure() {
    let site = Site::new();
    let source = erp();
    source.fail_table("AR_InvoiceHistoryHeader", "table locked");
    let scheduler = site.scheduler(config(&site.path), Arc::new(FakeConnector::new(source)));
    let job_id = site.jobs()[0].id;

    scheduler.run_now(job_id).await.unwrap();
    let job = &site.jobs()[0];
    assert_eq!(job.last_status.as_deref(), Some("failure"));
    assert!(
        job.last_run_log
            .as_deref()
            .unwrap()
            .contains("SalesOrderHeader: FAILED (remote fetch failed: query failed: table locked)")
    );
}

#[tokio::test]
async fn connection_failure_is_recorded_as_error() {
    let site = Site::new();
    let scheduler = site.scheduler(
        config(&site.path),
        Arc::new(FakeConnector::failing("Data source name not found")),
    );
    let job_id = site.jobs()[0].id;

    scheduler.run_now(job_id).await.unwrap();
    let job = &site.jobs()[0];
    assert_eq!(job.last_status.as_deref(), Some("error"));
    assert!(
        job.last_run_log
            .as_deref()
            .unwrap()
            .contains("Data source name not found")
    );
}

#[tokio::test]
async fn unknown_job_kind_is_recorded_as_error() {
    let site = Site::new();
    site.store()
        .execute(
            "INSERT INTO scheduler_jobs (job_name, job_kind, interval_minutes, enabled)
             VALUES ('Legacy cleanup', 'cleanup.py', 5, 1)",
            &[],
        )
        .unwrap();
    let connector = Arc::new(FakeConnector::new(erp()));
    let scheduler = site.scheduler(config(&site.path), connector.clone());
    let legacy = site
        .jobs()
        .into_iter()
        .find(|job| job.kind == "cleanup.py")
        .unwrap();

    let run = scheduler.run_now(legacy.id).await.unwrap();
    assert_eq!(run.status.as_str(), "error");
    assert_eq!(run.log, "unknown job kind \"cleanup.py\"");
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn run_now_rejects_unregistered_jobs() {
    let site = Site::new();
    let scheduler = site.scheduler(config(&site.path), Arc::new(FakeConnector::new(erp())));
    assert!(matches!(
        scheduler.run_now(999).await,
        Err(SchedulerError::UnknownJob { id: 999 })
    ));
}

/// Connects only after a delay, then refuses.
struct SlowConnector(Duration);

impl SourceConnector for SlowConnector {
    fn connect(&self, config: &SageConfig) -> Result<Box<dyn RemoteSource>, SourceError> {
        std::thread::sleep(self.0);
        Err(SourceError::Connect {
            dsn: config.dsn.clone(),
            message: "too late".to_string(),
        })
    }
}

#[tokio::test]
async fn slow_runs_time_out() {
    let site = Site::new();
    let mut config = config(&site.path);
    config.job_timeout = Duration::from_millis(50);
    let scheduler = site.scheduler(config, Arc::new(SlowConnector(Duration::from_millis(500))));
    let job_id = site.jobs()[0].id;

    let run = scheduler.run_now(job_id).await.unwrap();
    assert_eq!(run.status.as_str(), "timeout");
    assert_eq!(site.jobs()[0].last_status.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn timed_out_run_blocks_the_next_until_it_ends() {
    let site = Site::new();
    let mut config = config(&site.path);
    config.job_timeout = Duration::from_millis(50);
    let scheduler = site.scheduler(config, Arc::new(SlowConnector(Duration::from_millis(400))));
    let job_id = site.jobs()[0].id;

    let first = scheduler.run_now(job_id).await.unwrap();
    assert_eq!(first.status.as_str(), "timeout");

    let second = scheduler.run_now(job_id).await.unwrap();
    assert_eq!(second.status.as_str(), "error");
    assert!(second.log.contains("still in progress"), "{}", second.log);

    tokio::time::sleep(Duration::from_millis(800)).await;
    let third = scheduler.run_now(job_id).await.unwrap();
    assert_eq!(third.status.as_str(), "timeout");
}

#[tokio::test]
async fn started_jobs_run_until_stopped() {
    let site = Site::new();
    let connector = Arc::new(FakeConnector::new(erp()));
    let mut scheduler = site.scheduler(config(&site.path), connector.clone());

    assert_eq!(scheduler.start(), 1);
    assert!(scheduler.is_running());
    assert_eq!(scheduler.start(), 0);

    let mut recorded = false;
    for _ in 0..100 {
        if site.jobs()[0].last_status.is_some() {
            recorded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    scheduler.stop().await;

    assert!(recorded, "the first run was never recorded");
    assert!(!scheduler.is_running());
    assert_eq!(connector.connects(), 1);
    assert_eq!(site.jobs()[0].last_status.as_deref(), Some("success"));
}
