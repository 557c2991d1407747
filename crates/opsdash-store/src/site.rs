//! Site configuration: store creation and Sage connection settings.

use std::path::Path;

use rusqlite::{OptionalExtension, params};
use tracing::{info, warn};

use opsdash_model::{SageConfig, SetupConfig};

use crate::error::StoreError;
use crate::passphrase::Passphrase;
use crate::schema::{DEFAULT_SYNC_INTERVAL_MINUTES, DEFAULT_SYNC_JOB_NAME};
use crate::store::LocalStore;

const SAGE_SYSTEM: &str = "sage100";
const SAGE_DSN_KEY: &str = "sage_dsn";
const SAGE_COMPANY_KEY: &str = "sage_company_code";

impl LocalStore {
    /// Creates a new encrypted store with the full schema and site settings.
    ///
    /// A half-written file is removed when any step fails.
    pub fn create(
        path: &Path,
        passphrase: &Passphrase,
        setup: &SetupConfig,
    ) -> Result<Self, StoreError> {
        if path.exists() {
            return Err(StoreError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let missing = setup.sage.missing_fields();
        if !missing.is_empty() {
            return Err(StoreError::config(format!(
                "missing Sage 100 settings: {}",
                missing.join(", ")
            )));
        }

        let result = Self::connect(path, passphrase).and_then(|mut store| {
            store.apply_schema()?;
            store.seed(setup)?;
            Ok(store)
        });
        match result {
            Ok(store) => {
                info!(path = %path.display(), "encrypted store created");
                Ok(store)
            }
            Err(error) => {
                if let Err(remove_error) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %remove_error, "failed to remove partial store");
                }
                Err(error)
            }
        }
    }

    fn seed(&mut self, setup: &SetupConfig) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)",
            params![SAGE_DSN_KEY, setup.sage.dsn],
        )?;
        tx.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)",
            params![SAGE_COMPANY_KEY, setup.sage.company_code],
        )?;
        tx.execute(
            "INSERT INTO credentials (system, server, database, username, password)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                SAGE_SYSTEM,
                setup.sage.server,
                setup.sage.database,
                setup.sage.username,
                setup.sage.password
            ],
        )?;
        tx.execute(
            "INSERT INTO scheduler_jobs (job_name, job_kind, interval_minutes, enabled)
             VALUES (?1, ?2, ?3, 1)",
            params![
                DEFAULT_SYNC_JOB_NAME,
                opsdash_model::JobKind::SageSync.as_str(),
                DEFAULT_SYNC_INTERVAL_MINUTES
            ],
        )?;
        {
            let mut stmt = tx.prepare("INSERT INTO SieveDefaults (USSieve) VALUES (?1)")?;
            for sieve in &setup.sieve_defaults {
                stmt.execute(params![sieve])?;
            }
            let mut stmt = tx.prepare("INSERT INTO Sample (Name) VALUES (?1)")?;
            for sample in &setup.samples {
                stmt.execute(params![sample])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Reads the Sage 100 connection settings.
    pub fn sage_config(&self) -> Result<SageConfig, StoreError> {
        let credentials = self
            .conn
            .query_row(
                "SELECT server, database, username, password FROM credentials WHERE system = ?1",
                params![SAGE_SYSTEM],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::config("Sage 100 credentials not found"))?;
        let dsn = self
            .config_value(SAGE_DSN_KEY)?
            .ok_or_else(|| StoreError::config("Sage DSN not found in config"))?;
        let company_code = self
            .config_value(SAGE_COMPANY_KEY)?
            .ok_or_else(|| StoreError::config("Sage company code not found in config"))?;
        let (server, database, username, password) = credentials;
        Ok(SageConfig {
            dsn,
            company_code,
            server: server.unwrap_or_default(),
            database: database.unwrap_or_default(),
            username: username.unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }

    pub fn config_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Default sieve sizes, ascending.
    pub fn sieve_defaults(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT USSieve FROM SieveDefaults ORDER BY USSieve")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<i64>>>()?)
    }

    /// Sample product names, alphabetical.
    pub fn samples(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT Name FROM Sample ORDER BY Name")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }
}
