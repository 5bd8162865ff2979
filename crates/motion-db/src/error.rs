//! Result Store / read-projection error types.

use thiserror::Error;

pub type DbResultT<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("failed to (de)serialize a stored series: {0}")]
    Serialize(#[from] serde_json::Error),
}
