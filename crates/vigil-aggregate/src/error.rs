//! Aggregation error types.

use thiserror::Error;

pub type AggregateResult<T> = Result<T, AggregateError>;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Storage error: {0}")]
    Storage(#[from] vigil_storage::StorageError),
}
