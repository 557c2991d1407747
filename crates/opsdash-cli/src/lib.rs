//! CLI library components for the operations dashboard.

pub mod cli;
pub mod logging;
pub mod summary;
