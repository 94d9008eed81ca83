//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Session error: {0}")]
    Session(#[from] vigil_session::SessionError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] vigil_aggregate::AggregateError),
}
