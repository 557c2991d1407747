use opsdash_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("job {id} is not registered")]
    UnknownJob { id: i64 },

    #[error("failed to record job run: {0}")]
    Store(#[from] StoreError),

    #[error("job task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
