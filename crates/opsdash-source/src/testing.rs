//! In-memory stand-ins for the ERP, for tests in dependent crates.
//!
//! A [`FakeSource`] serves rows per remote table name. Clones share state, so
//! a test can keep a handle, hand another to a [`FakeConnector`], and inspect
//! the queries that were issued afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use opsdash_model::{RemoteRow, SageConfig};

use crate::error::SourceError;
use crate::{RemoteSource, SourceConnector};

#[derive(Debug, Default)]
struct FakeState {
    tables: HashMap<String, Vec<RemoteRow>>,
    failures: HashMap<String, String>,
    queries: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str, rows: Vec<RemoteRow>) -> Self {
        self.set_table(table, rows);
        self
    }

    /// Replaces the rows served for `table`.
    pub fn set_table(&self, table: &str, rows: Vec<RemoteRow>) {
        self.lock().tables.insert(table.to_string(), rows);
    }

    /// Makes every query against `table` fail with `message`.
    pub fn fail_table(&self, table: &str, message: &str) {
        self.lock()
            .failures
            .insert(table.to_string(), message.to_string());
    }

    /// Every query issued so far, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The table a `SELECT ... FROM <table>` reads.
fn queried_table(sql: &str) -> Option<&str> {
    let (_, rest) = sql.split_once(" FROM ")?;
    rest.split_whitespace()
        .next()
        .map(|table| table.trim_matches('"'))
}

impl RemoteSource for FakeSource {
    fn fetch_all(&mut self, sql: &str) -> Result<Vec<RemoteRow>, SourceError> {
        let mut state = self.lock();
        state.queries.push(sql.to_string());
        let table = queried_table(sql)
            .ok_or_else(|| SourceError::fetch(format!("unsupported query: {sql}")))?;
        if let Some(message) = state.failures.get(table) {
            return Err(SourceError::fetch(message.clone()));
        }
        state
            .tables
            .get(table)
            .cloned()
            .ok_or_else(|| SourceError::fetch(format!("table {table} not found")))
    }
}

/// Hands out clones of one [`FakeSource`], or refuses to connect.
#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    source: FakeSource,
    connect_error: Option<String>,
    connects: Arc<Mutex<usize>>,
}

impl FakeConnector {
    pub fn new(source: FakeSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// A connector whose every `connect` fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            connect_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn source(&self) -> &FakeSource {
        &self.source
    }

    /// Number of connection attempts so far.
    pub fn connects(&self) -> usize {
        *self.connects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SourceConnector for FakeConnector {
    fn connect(&self, config: &SageConfig) -> Result<Box<dyn RemoteSource>, SourceError> {
        *self.connects.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        if let Some(message) = &self.connect_error {
            return Err(SourceError::Connect {
                dsn: config.dsn.clone(),
                message: message.clone(),
            });
        }
        Ok(Box::new(self.source.clone()))
    }
}
