//! Session records and their event log.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Allocate a new session id.
///
/// Session ids live in their own namespace, distinct from identity ids.
pub fn new_session_id() -> String {
    format!("ses-{}", Uuid::new_v4())
}

/// One inference result appended to a session's event log.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionEvent {
    /// Unix ms the result was recorded
    pub timestamp: i64,
    /// Tracked identity the result belongs to
    pub identity_id: String,
    /// Prompt the inference call was issued with
    pub prompt: String,
    /// Raw structured payload returned by the inference engine
    pub payload: serde_json::Value,
}

/// The persisted record of one visit.
///
/// Events are append-only and ordered by insertion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionRecord {
    pub session_id: String,
    /// Unix ms the session was opened
    pub first_seen: i64,
    /// Unix ms of the last cycle the identity was present
    pub last_seen: i64,
    pub events: Vec<SessionEvent>,
}

impl SessionRecord {
    /// Create an empty record opening now.
    pub fn open(session_id: impl Into<String>, now: i64) -> Self {
        Self {
            session_id: session_id.into(),
            first_seen: now,
            last_seen: now,
            events: Vec::new(),
        }
    }

    /// Visit duration in seconds, derived from the seen timestamps.
    pub fn duration_secs(&self) -> f64 {
        (self.last_seen - self.first_seen) as f64 / 1000.0
    }
}
