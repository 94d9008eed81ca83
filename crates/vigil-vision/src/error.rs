//! Vision boundary error types.

use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed inference output: {0}")]
    Malformed(String),

    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

impl VisionError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
