//! Remote source adapter for the Sage 100 ERP database.
//!
//! The sync engine talks to the ERP through [`RemoteSource`]; the scheduler
//! opens sources through a shared [`SourceConnector`]. [`odbc`] provides the
//! production implementation.

#![deny(unsafe_code)]

pub mod error;
pub mod odbc;
#[cfg(feature = "testing")]
pub mod testing;

use opsdash_model::{RemoteRow, SageConfig};

pub use error::SourceError;
pub use odbc::{OdbcConnector, OdbcSource, connection_string};

/// A read-only connection that can run a query and return every row.
pub trait RemoteSource {
    /// Runs `sql` and fetches all rows, each in select-list order.
    fn fetch_all(&mut self, sql: &str) -> Result<Vec<RemoteRow>, SourceError>;
}

/// Opens remote connections from the site's Sage settings.
pub trait SourceConnector: Send + Sync {
    fn connect(&self, config: &SageConfig) -> Result<Box<dyn RemoteSource>, SourceError>;
}
