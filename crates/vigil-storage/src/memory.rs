//! In-memory session store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use vigil_models::{SessionEvent, SessionRecord, SessionSummary};

use crate::error::{StorageError, StorageResult};
use crate::store::SessionStore;

/// In-process store backing tests and embedded deployments.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SessionRecord>,
    summaries: HashMap<String, SessionSummary>,
    watermark: Option<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::internal("store lock poisoned"))
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> usize {
        self.inner.lock().map(|i| i.sessions.len()).unwrap_or(0)
    }

    /// Fetch one session record by id.
    pub fn get_session(&self, session_id: &str) -> Option<SessionRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.sessions.get(session_id).cloned())
    }

    /// Fetch one summary by session id.
    pub fn get_summary(&self, session_id: &str) -> Option<SessionSummary> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.summaries.get(session_id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn start_session(&self, record: &SessionRecord) -> StorageResult<()> {
        self.lock()?
            .sessions
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    async fn append_event(&self, session_id: &str, event: &SessionEvent) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let record = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StorageError::unknown_session(session_id))?;
        record.events.push(event.clone());
        Ok(())
    }

    async fn heartbeat(&self, session_id: &str, last_seen: i64) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let record = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StorageError::unknown_session(session_id))?;
        record.last_seen = last_seen;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> StorageResult<()> {
        self.lock()?.sessions.remove(session_id);
        Ok(())
    }

    async fn sessions_in_range(&self, start: i64, end: i64) -> StorageResult<Vec<SessionRecord>> {
        let mut records: Vec<SessionRecord> = self
            .lock()?
            .sessions
            .values()
            .filter(|r| r.first_seen >= start && r.first_seen < end)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.first_seen);
        Ok(records)
    }

    async fn write_summaries(&self, summaries: &[SessionSummary]) -> StorageResult<()> {
        let mut inner = self.lock()?;
        for summary in summaries {
            inner
                .summaries
                .insert(summary.session_id.clone(), summary.clone());
        }
        Ok(())
    }

    async fn load_watermark(&self) -> StorageResult<Option<i64>> {
        Ok(self.lock()?.watermark)
    }

    async fn store_watermark(&self, hour_start: i64) -> StorageResult<()> {
        self.lock()?.watermark = Some(hour_start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(identity_id: &str, timestamp: i64) -> SessionEvent {
        SessionEvent {
            timestamp,
            identity_id: identity_id.to_string(),
            prompt: "p".to_string(),
            payload: serde_json::json!({"mood": "happy"}),
        }
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let store = MemoryStore::new();
        store
            .start_session(&SessionRecord::open("ses-a", 1_000))
            .await
            .unwrap();
        store.append_event("ses-a", &event("trk-1", 1_500)).await.unwrap();
        store.heartbeat("ses-a", 2_000).await.unwrap();

        let record = store.get_session("ses-a").unwrap();
        assert_eq!(record.events.len(), 1);
        assert_eq!(record.last_seen, 2_000);
    }

    #[tokio::test]
    async fn test_append_to_unknown_session_fails() {
        let store = MemoryStore::new();
        let err = store
            .append_event("ses-missing", &event("trk-1", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .start_session(&SessionRecord::open("ses-a", 0))
            .await
            .unwrap();
        store.delete_session("ses-a").await.unwrap();
        store.delete_session("ses-a").await.unwrap();
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_range_is_half_open_on_first_seen() {
        let store = MemoryStore::new();
        for (id, first_seen) in [("ses-a", 999), ("ses-b", 1_000), ("ses-c", 1_999), ("ses-d", 2_000)] {
            store
                .start_session(&SessionRecord::open(id, first_seen))
                .await
                .unwrap();
        }

        let records = store.sessions_in_range(1_000, 2_000).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["ses-b", "ses-c"]);
    }

    #[tokio::test]
    async fn test_watermark_starts_absent() {
        let store = MemoryStore::new();
        assert_eq!(store.load_watermark().await.unwrap(), None);
        store.store_watermark(3_600_000).await.unwrap();
        assert_eq!(store.load_watermark().await.unwrap(), Some(3_600_000));
    }

    #[tokio::test]
    async fn test_summaries_upsert() {
        let store = MemoryStore::new();
        let mut summary = SessionSummary {
            session_id: "ses-a".to_string(),
            timestamp: 0,
            duration_secs: 10.0,
            modes: Default::default(),
            style_terms: Default::default(),
        };
        store.write_summaries(std::slice::from_ref(&summary)).await.unwrap();
        summary.duration_secs = 20.0;
        store.write_summaries(std::slice::from_ref(&summary)).await.unwrap();
        assert_eq!(store.get_summary("ses-a").unwrap().duration_secs, 20.0);
    }
}
