//! Encrypted local store for the operations dashboard.
//!
//! The store is a SQLCipher database unlocked with a [`Passphrase`]. It holds
//! the synced Sage tables, the site configuration (Sage DSN, company code and
//! credentials) and the scheduler's job table.

#![deny(unsafe_code)]

pub mod error;
pub mod jobs;
pub mod passphrase;
pub mod schema;
pub mod site;
pub mod store;

pub use error::StoreError;
pub use passphrase::Passphrase;
pub use store::{DEFAULT_DATABASE_FILE, LocalStore};
