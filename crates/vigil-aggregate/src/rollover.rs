//! Wall-clock hour rollover.

use std::sync::Arc;

use tracing::{debug, info};

use vigil_models::{AttributeSchema, SessionSummary};
use vigil_storage::SessionStore;

use crate::error::AggregateResult;
use crate::summary::summarize_session;

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;

/// Floor a Unix-ms timestamp to its hour boundary.
pub fn hour_floor(ms: i64) -> i64 {
    ms - ms.rem_euclid(HOUR_MS)
}

/// Batch-summarizes sessions at hour boundaries.
///
/// The only state is the persisted watermark: the hour floor up to which
/// aggregation has already run. Checking is cheap and idempotent, so the
/// engine invokes it opportunistically after every analysis cycle.
pub struct HourlyAggregator {
    store: Arc<dyn SessionStore>,
    schema: AttributeSchema,
}

impl HourlyAggregator {
    pub fn new(store: Arc<dyn SessionStore>, schema: AttributeSchema) -> Self {
        Self { store, schema }
    }

    /// Aggregate any whole hours that have elapsed since the watermark.
    ///
    /// Returns the number of summaries written. A missing watermark is
    /// initialized to the current hour without aggregating, so a partial
    /// first hour is never summarized. When the process slept across
    /// several hour boundaries, every missed hour is caught up one at a
    /// time, advancing the watermark after each.
    pub async fn check_rollover(&self, now: i64) -> AggregateResult<u32> {
        let current = hour_floor(now);

        let Some(watermark) = self.store.load_watermark().await? else {
            self.store.store_watermark(current).await?;
            debug!(hour = current, "initialized aggregation watermark");
            return Ok(0);
        };

        if current <= watermark {
            return Ok(0);
        }

        let mut written = 0u32;
        let mut hour = watermark;
        while hour < current {
            let sessions = self.store.sessions_in_range(hour, hour + HOUR_MS).await?;
            if !sessions.is_empty() {
                let summaries: Vec<SessionSummary> = sessions
                    .iter()
                    .map(|record| summarize_session(record, &self.schema))
                    .collect();
                self.store.write_summaries(&summaries).await?;
                written += summaries.len() as u32;
                info!(
                    hour = %hour_label(hour),
                    sessions = summaries.len(),
                    "aggregated hour"
                );
            }
            hour += HOUR_MS;
            self.store.store_watermark(hour).await?;
        }

        Ok(written)
    }
}

fn hour_label(hour: i64) -> String {
    chrono::DateTime::from_timestamp_millis(hour)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| hour.to_string())
}
