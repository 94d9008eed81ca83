//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn unknown_session(id: impl Into<String>) -> Self {
        Self::UnknownSession(id.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
