//! Background scheduling of dashboard jobs.
//!
//! A [`JobRegistry`] is loaded from the store's `scheduler_jobs` table and
//! handed to one [`Scheduler`], which runs every job on its interval until it
//! is stopped. Each run is recorded back into `scheduler_jobs`.

pub mod error;
pub mod registry;
pub mod scheduler;

pub use error::SchedulerError;
pub use registry::{JobRegistry, JobSpec};
pub use scheduler::{Scheduler, SchedulerConfig};
