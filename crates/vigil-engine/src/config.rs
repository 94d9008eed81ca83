//! Engine configuration.

use vigil_models::AttributeSchema;
use vigil_session::SessionConfig;
use vigil_tracker::TrackerConfig;

/// Top-level engine configuration.
///
/// The frame loop and the analysis loop run on independent cadences: the
/// tracker's update rate stays stable regardless of how fast the detector
/// or the inference engine happen to be.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between tracker frames (ms)
    pub frame_interval_ms: u64,
    pub tracker: TrackerConfig,
    pub session: SessionConfig,
    /// Attributes requested from the inference engine each cycle
    pub schema: AttributeSchema,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
            tracker: TrackerConfig::default(),
            session: SessionConfig::default(),
            schema: AttributeSchema::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            frame_interval_ms: std::env::var("VIGIL_FRAME_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            tracker: TrackerConfig::from_env(),
            session: SessionConfig::from_env(),
            schema: AttributeSchema::default(),
        }
    }
}
