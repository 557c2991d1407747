//! Connection handling and row-oriented query primitives.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, Transaction, params_from_iter};
use tracing::{debug, warn};

use opsdash_model::{LocalRow, LocalValue, is_identifier};

use crate::error::StoreError;
use crate::passphrase::Passphrase;
use crate::schema::{OPERATIONS_TABLES, SALES_TABLES, SCHEMA_VERSION, SYSTEM_TABLES};

/// File name used when no database path is configured.
pub const DEFAULT_DATABASE_FILE: &str = "operations_dashboard.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// An open connection to the encrypted local database.
pub struct LocalStore {
    pub(crate) conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Opens an existing store and unlocks it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Missing`] when the file does not exist,
    /// [`StoreError::Auth`] when the passphrase does not decrypt it.
    pub fn open(path: &Path, passphrase: &Passphrase) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing {
                path: path.to_path_buf(),
            });
        }
        let store = Self::connect(path, passphrase)?;
        debug!(path = %path.display(), "local store unlocked");
        Ok(store)
    }

    /// Opens an unencrypted in-memory store with the full schema.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", false)?;
        let store = Self { conn, path: None };
        store.apply_schema()?;
        Ok(store)
    }

    pub(crate) fn connect(path: &Path, passphrase: &Passphrase) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "key", passphrase.expose())?;
        // The key is only checked on the first read.
        if let Err(error) = conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        }) {
            if error.sqlite_error_code() == Some(ErrorCode::NotADatabase) {
                return Err(StoreError::Auth {
                    path: path.to_path_buf(),
                });
            }
            return Err(error.into());
        }
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // ERP history may reference purged master rows.
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Creates every table that does not exist yet.
    pub fn apply_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SYSTEM_TABLES)?;
        self.conn.execute_batch(SALES_TABLES)?;
        self.conn.execute_batch(OPERATIONS_TABLES)?;
        self.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Runs a query and returns every row as positional values.
    pub fn query(&self, sql: &str, params: &[LocalValue]) -> Result<Vec<LocalRow>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(params.iter().map(to_sql_value)), |row| {
            (0..column_count)
                .map(|index| row.get::<_, Value>(index).map(from_sql_value))
                .collect::<rusqlite::Result<LocalRow>>()
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Executes one statement and returns the number of changed rows.
    pub fn execute(&self, sql: &str, params: &[LocalValue]) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .execute(sql, params_from_iter(params.iter().map(to_sql_value)))?)
    }

    /// Executes one statement per row inside a single transaction.
    ///
    /// Commits when every row succeeds. On the first failing row the whole
    /// batch is rolled back and the error is returned, so no partial batch is
    /// ever persisted.
    pub fn execute_many(&mut self, sql: &str, rows: &[LocalRow]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        match write_rows(&tx, sql, rows) {
            Ok(written) => {
                tx.commit()?;
                Ok(written)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback() {
                    warn!(error = %rollback_error, "rollback failed");
                }
                Err(error.into())
            }
        }
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> Result<usize, StoreError> {
        if !is_identifier(table) {
            return Err(StoreError::InvalidTable {
                name: table.to_string(),
            });
        }
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                    row.get(0)
                })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Closes the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, error)| error.into())
    }
}

fn write_rows(tx: &Transaction<'_>, sql: &str, rows: &[LocalRow]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(sql)?;
    let mut written = 0;
    for row in rows {
        written += stmt.execute(params_from_iter(row.iter().map(to_sql_value)))?;
    }
    Ok(written)
}

fn to_sql_value(value: &LocalValue) -> Value {
    match value {
        LocalValue::Null => Value::Null,
        LocalValue::Integer(value) => Value::Integer(*value),
        LocalValue::Real(value) => Value::Real(*value),
        LocalValue::Text(value) => Value::Text(value.clone()),
    }
}

fn from_sql_value(value: Value) -> LocalValue {
    match value {
        Value::Null => LocalValue::Null,
        Value::Integer(value) => LocalValue::Integer(value),
        Value::Real(value) => LocalValue::Real(value),
        Value::Text(value) => LocalValue::Text(value),
        Value::Blob(bytes) => LocalValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_has_schema() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(store.row_count("Customer").unwrap(), 0);
        assert!(store.path().is_none());
    }

    #[test]
    fn query_returns_positional_values() {
        let store = LocalStore::open_in_memory().unwrap();
        store
            .execute(
                "INSERT INTO Customer (CustomerNo, CustomerName) VALUES (?1, ?2)",
                &["C1".into(), LocalValue::Null],
            )
            .unwrap();
        let rows = store
            .query(
                "SELECT CustomerNo, CustomerName, 1.5, 7 FROM Customer WHERE CustomerNo = ?1",
                &["C1".into()],
            )
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![
                LocalValue::Text("C1".to_string()),
                LocalValue::Null,
                LocalValue::Real(1.5),
                LocalValue::Integer(7),
            ]]
        );
    }

    #[test]
    fn foreign_keys_are_not_enforced() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(
            store.query("PRAGMA foreign_keys", &[]).unwrap(),
            vec![vec![LocalValue::Integer(0)]]
        );
        store
            .execute(
                "INSERT INTO SalesOrderHeader (SalesOrderNo, CustomerNo) VALUES ('0100002', 'C9')",
                &[],
            )
            .unwrap();
        assert_eq!(store.row_count("SalesOrderHeader").unwrap(), 1);
    }

    #[test]
    fn row_count_rejects_odd_table_names() {
        let store = LocalStore::open_in_memory().unwrap();
        assert!(matches!(
            store.row_count("Customer; DROP TABLE config"),
            Err(StoreError::InvalidTable { .. })
        ));
    }
}
