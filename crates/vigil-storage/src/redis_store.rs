//! Redis-backed session store.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use vigil_models::{SessionEvent, SessionRecord, SessionSummary};

use crate::error::{StorageError, StorageResult};
use crate::store::SessionStore;

/// Redis store configuration.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis URL
    pub redis_url: String,
    /// Key prefix for all store keys
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "vigil".to_string(),
        }
    }
}

impl RedisStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            key_prefix: std::env::var("VIGIL_KEY_PREFIX").unwrap_or_else(|_| "vigil".to_string()),
        }
    }
}

/// Durable session store over Redis.
///
/// Records live as JSON values keyed by session id, with a sorted set over
/// `first_seen` backing the hourly range queries.
pub struct RedisStore {
    client: redis::Client,
    config: RedisStoreConfig,
}

impl RedisStore {
    /// Create a new Redis store.
    pub fn new(config: RedisStoreConfig) -> StorageResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(RedisStoreConfig::from_env())
    }

    async fn connection(&self) -> StorageResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn session_key(&self, session_id: &str) -> String {
        format!("{}:session:{}", self.config.key_prefix, session_id)
    }

    fn summary_key(&self, session_id: &str) -> String {
        format!("{}:summary:{}", self.config.key_prefix, session_id)
    }

    fn index_key(&self) -> String {
        format!("{}:sessions:by_start", self.config.key_prefix)
    }

    fn watermark_key(&self) -> String {
        format!("{}:watermark", self.config.key_prefix)
    }

    async fn load_session(&self, session_id: &str) -> StorageResult<SessionRecord> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = conn.get(self.session_key(session_id)).await?;
        let payload = payload.ok_or_else(|| StorageError::unknown_session(session_id))?;
        Ok(serde_json::from_str(&payload)?)
    }

    async fn save_session(&self, record: &SessionRecord) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(record)?;
        let _: () = conn.set(self.session_key(&record.session_id), payload).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn start_session(&self, record: &SessionRecord) -> StorageResult<()> {
        self.save_session(record).await?;
        let mut conn = self.connection().await?;
        let _: () = conn
            .zadd(self.index_key(), &record.session_id, record.first_seen)
            .await?;
        debug!(session_id = %record.session_id, "started session");
        Ok(())
    }

    async fn append_event(&self, session_id: &str, event: &SessionEvent) -> StorageResult<()> {
        let mut record = self.load_session(session_id).await?;
        record.events.push(event.clone());
        self.save_session(&record).await
    }

    async fn heartbeat(&self, session_id: &str, last_seen: i64) -> StorageResult<()> {
        let mut record = self.load_session(session_id).await?;
        record.last_seen = last_seen;
        self.save_session(&record).await
    }

    async fn delete_session(&self, session_id: &str) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(self.session_key(session_id)).await?;
        let _: () = conn.zrem(self.index_key(), session_id).await?;
        Ok(())
    }

    async fn sessions_in_range(&self, start: i64, end: i64) -> StorageResult<Vec<SessionRecord>> {
        let mut conn = self.connection().await?;
        // Half-open interval: the index scores are first_seen timestamps
        let ids: Vec<String> = conn
            .zrangebyscore(self.index_key(), start, format!("({}", end))
            .await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let payload: Option<String> = conn.get(self.session_key(&id)).await?;
            // A deleted session may leave a stale index entry behind
            if let Some(payload) = payload {
                records.push(serde_json::from_str(&payload)?);
            }
        }
        Ok(records)
    }

    async fn write_summaries(&self, summaries: &[SessionSummary]) -> StorageResult<()> {
        if summaries.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        for summary in summaries {
            let payload = serde_json::to_string(summary)?;
            let _: () = conn.set(self.summary_key(&summary.session_id), payload).await?;
        }
        debug!(count = summaries.len(), "wrote summaries");
        Ok(())
    }

    async fn load_watermark(&self) -> StorageResult<Option<i64>> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = conn.get(self.watermark_key()).await?;
        Ok(value)
    }

    async fn store_watermark(&self, hour_start: i64) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(self.watermark_key(), hour_start).await?;
        Ok(())
    }
}
