//! Worker pool error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker pool is shutting down")]
    PoolClosed,

    #[error("blocking task panicked: {0}")]
    TaskPanicked(String),
}
