//! Session manager error types.

use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by the session manager.
///
/// Inference failures never appear here: a failed call is logged, counted
/// and absorbed by the cycle. Only storage failures propagate.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] vigil_storage::StorageError),
}
