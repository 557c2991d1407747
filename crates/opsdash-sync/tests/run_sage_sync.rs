//! Full runs against an on-disk encrypted store.

use std::path::Path;

use opsdash_model::{RemoteValue, SageConfig, SetupConfig};
use opsdash_source::testing::{FakeConnector, FakeSource};
use opsdash_store::{LocalStore, Passphrase, StoreError};
use opsdash_sync::{SyncError, run_sage_sync, sage_mappings};

fn create_store(path: &Path) {
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
    LocalStore::create(path, &passphrase(), &setup)
        .unwrap()
        .close()
        .unwrap();
}

fn passphrase() -> Passphrase {
    Passphrase::new("master").unwrap()
}

fn populated_source() -> FakeSource {
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

#[test]
fn syncs_into_the_encrypted_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.db");
    create_store(&path);
    let connector = FakeConnector::new(populated_source());

    let run = run_sage_sync(&path, &passphrase(), &connector, &sage_mappings().unwrap()).unwrap();
    assert!(run.succeeded());
    assert_eq!(run.results.len(), 4);
    assert_eq!(run.rows_written(), 2);
    assert!(run.finished_at >= run.started_at);
    assert_eq!(connector.connects(), 1);

    let store = LocalStore::open(&path, &passphrase()).unwrap();
    assert_eq!(store.row_count("Customer").unwrap(), 2);
}

#[test]
fn connection_failure_produces_no_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.db");
    create_store(&path);
    let connector = FakeConnector::failing("Data source name not found");

    let err = run_sage_sync(&path, &passphrase(), &connector, &sage_mappings().unwrap())
        .unwrap_err();
    assert!(matches!(err, SyncError::Connection(_)), "got {err:?}");
    assert!(err.to_string().contains("Data source name not found"));
}

#[test]
fn wrong_passphrase_never_reaches_the_erp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.db");
    create_store(&path);
    let connector = FakeConnector::new(populated_source());

    let err = run_sage_sync(
        &path,
        &Passphrase::new("guess").unwrap(),
        &connector,
        &sage_mappings().unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Auth { .. })));
    assert_eq!(connector.connects(), 0);
}

#[test]
fn missing_store_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let connector = FakeConnector::new(populated_source());
    let err = run_sage_sync(
        &dir.path().join("absent.db"),
        &passphrase(),
        &connector,
        &sage_mappings().unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Missing { .. })));
}
