//! Sync of Sage 100 tables into the encrypted local store.
//!
//! - [`engine::sync_table`] pulls one mapped table and upserts it in a single
//!   transaction
//! - [`engine::run_sync`] runs a list of mappings in order and stops on the
//!   first failure
//! - [`run::run_sage_sync`] opens both sides from the site configuration and
//!   runs a whole set

pub mod coerce;
pub mod engine;
pub mod error;
pub mod mappings;
pub mod run;

pub use coerce::{coerce_row, coerce_value};
pub use engine::{build_select, build_upsert, run_sync, sync_table};
pub use error::SyncError;
pub use mappings::sage_mappings;
pub use run::{SyncRun, run_sage_sync};
