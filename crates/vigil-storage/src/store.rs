//! The session store interface.

use async_trait::async_trait;

use vigil_models::{SessionEvent, SessionRecord, SessionSummary};

use crate::error::StorageResult;

/// Persistent key-value store for sessions, summaries and the aggregation
/// watermark.
///
/// Writes are at-most-once from the engine's perspective: a failed write
/// surfaces to the caller but never rolls back in-memory lifecycle state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a freshly opened session record.
    async fn start_session(&self, record: &SessionRecord) -> StorageResult<()>;

    /// Append one event to an existing session's log.
    async fn append_event(&self, session_id: &str, event: &SessionEvent) -> StorageResult<()>;

    /// Refresh a session's `last_seen`, written when the session finalizes.
    async fn heartbeat(&self, session_id: &str, last_seen: i64) -> StorageResult<()>;

    /// Remove a session entirely. Deleting an absent session is not an error.
    async fn delete_session(&self, session_id: &str) -> StorageResult<()>;

    /// Sessions whose `first_seen` falls in `[start, end)`, ordered by
    /// `first_seen`.
    async fn sessions_in_range(&self, start: i64, end: i64) -> StorageResult<Vec<SessionRecord>>;

    /// Bulk-upsert summaries; rebuilding an existing summary overwrites it.
    async fn write_summaries(&self, summaries: &[SessionSummary]) -> StorageResult<()>;

    /// The aggregation watermark, if one has been stored yet.
    async fn load_watermark(&self) -> StorageResult<Option<i64>>;

    /// Persist the aggregation watermark.
    async fn store_watermark(&self, hour_start: i64) -> StorageResult<()>;
}
