//! Per-session hourly summaries.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Statistical summary of one closed (or still-running) session.
///
/// Built once per session by the hourly aggregator; a later rollover may
/// rebuild and overwrite it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionSummary {
    pub session_id: String,
    /// Unix ms the session opened (`first_seen` of the record)
    pub timestamp: i64,
    /// Visit duration in seconds
    pub duration_secs: f64,
    /// Modal value per categorical attribute
    pub modes: BTreeMap<String, String>,
    /// Token occurrence counts across the free-text attributes
    pub style_terms: BTreeMap<String, u32>,
}
