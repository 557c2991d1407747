//! Table sync engine and the fail-fast run loop.
//!
//! One table is synced as: remote `SELECT` of the mapped columns, per-value
//! coercion, then a single upsert batch inside one local transaction. The
//! batch either commits completely or is rolled back, and rows that vanished
//! from the remote side are never deleted locally.

use tracing::{debug, info, info_span, warn};

use opsdash_model::{FailureKind, LocalRow, SyncMapping, SyncResult};
use opsdash_source::RemoteSource;
use opsdash_store::LocalStore;

use crate::coerce::coerce_row;

/// `SELECT` of the mapping's remote columns, in mapping order.
pub fn build_select(mapping: &SyncMapping) -> String {
    let columns: Vec<&str> = mapping.remote_columns().collect();
    format!("SELECT {} FROM {}", columns.join(", "), mapping.remote_table())
}

/// Parameterized insert that overwrites every mapped column when a row with
/// the same primary key already exists.
pub fn build_upsert(mapping: &SyncMapping) -> String {
    let columns: Vec<String> = mapping.local_columns().map(quote).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("?{n}")).collect();
    let key: Vec<String> = mapping.primary_key().iter().map(|k| quote(k)).collect();
    let updates: Vec<String> = columns
        .iter()
        .map(|column| format!("{column} = excluded.{column}"))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {}",
        quote(mapping.local_table()),
        columns.join(", "),
        placeholders.join(", "),
        key.join(", "),
        updates.join(", ")
    )
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

/// Syncs one mapping and reports what happened.
///
/// Never returns an error: remote failures and local write failures are both
/// reported through the returned [`SyncResult`].
pub fn sync_table(
    remote: &mut dyn RemoteSource,
    local: &mut LocalStore,
    mapping: &SyncMapping,
) -> SyncResult {
    let span = info_span!("sync_table", table = mapping.local_table());
    let _guard = span.enter();
    let remote_table = mapping.remote_table();
    let table = mapping.local_table();

    let rows = match remote.fetch_all(&build_select(mapping)) {
        Ok(rows) => rows,
        Err(error) => {
            warn!(%error, remote_table, "remote fetch failed");
            return SyncResult::failure(
                remote_table,
                table,
                FailureKind::RemoteFetch,
                error.to_string(),
                0,
            );
        }
    };
    let fetched = rows.len();
    debug!(remote_table, rows = fetched, "fetched remote rows");
    if rows.is_empty() {
        info!("no remote rows, nothing to write");
        return SyncResult::success(remote_table, table, 0);
    }

    let width = mapping.columns().len();
    if let Some(row) = rows.iter().find(|row| row.len() != width) {
        let message = format!("row has {} values, expected {width}", row.len());
        warn!(%message, "remote fetch failed");
        return SyncResult::failure(remote_table, table, FailureKind::RemoteFetch, message, fetched);
    }

    let local_rows: Vec<LocalRow> = rows.into_iter().map(coerce_row).collect();
    if let Some(message) = null_key_message(mapping, &local_rows) {
        warn!(%message, "local write rejected");
        return SyncResult::failure(remote_table, table, FailureKind::LocalWrite, message, fetched);
    }

    match local.execute_many(&build_upsert(mapping), &local_rows) {
        Ok(_) => {
            info!(rows = fetched, "table synced");
            SyncResult::success(remote_table, table, fetched)
        }
        Err(error) => {
            warn!(%error, "local write failed, batch rolled back");
            SyncResult::failure(
                remote_table,
                table,
                FailureKind::LocalWrite,
                error.to_string(),
                fetched,
            )
        }
    }
}

/// Names the first row holding a NULL primary key value, if any.
fn null_key_message(mapping: &SyncMapping, rows: &[LocalRow]) -> Option<String> {
    let positions = mapping.key_positions();
    rows.iter().enumerate().find_map(|(index, row)| {
        positions
            .iter()
            .find(|&&position| row[position].is_null())
            .map(|&position| {
                format!(
                    "row {} has a NULL value in key column {}",
                    index + 1,
                    mapping.columns()[position].local
                )
            })
    })
}

/// Syncs each mapping in order and stops after the first failure.
///
/// The returned list holds one result per attempted mapping, so a failure is
/// always its last entry.
pub fn run_sync(
    remote: &mut dyn RemoteSource,
    local: &mut LocalStore,
    mappings: &[SyncMapping],
) -> Vec<SyncResult> {
    let span = info_span!("sync_run", tables = mappings.len());
    let _guard = span.enter();
    let mut results = Vec::with_capacity(mappings.len());
    for mapping in mappings {
        let result = sync_table(remote, local, mapping);
        let failed = !result.is_success();
        results.push(result);
        if failed {
            warn!(
                table = mapping.local_table(),
                skipped = mappings.len() - results.len(),
                "stopping sync run after failure"
            );
            break;
        }
    }
    results
}
