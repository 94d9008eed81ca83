//! IoU-based identity tracker.

use tokio::sync::watch;
use tracing::{debug, trace};

use vigil_models::{new_identity_id, BBox, Detection, IdentitySnapshot, TrackingView};

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum IoU to associate a detection with an existing identity
    pub iou_threshold: f32,
    /// Detections below this confidence are discarded before matching
    pub min_score: f32,
    /// Stricter confidence bar a detection must clear to open a new identity
    pub new_track_score: f32,
    /// Consecutive matched frames before an identity counts as real
    pub confirmation_frames: u32,
    /// Identities not matched for this long are pruned (ms)
    pub grace_period_ms: i64,
    /// Minimum normalized detection area
    pub min_area: f32,
    /// Allowed height/width band for detections
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            min_score: 0.5,
            new_track_score: 0.65,
            confirmation_frames: 3,
            grace_period_ms: 2_000,
            min_area: 0.005,
            min_aspect: 0.25,
            max_aspect: 4.0,
        }
    }
}

impl TrackerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            iou_threshold: env_parse("VIGIL_TRACKER_IOU", defaults.iou_threshold),
            min_score: env_parse("VIGIL_TRACKER_MIN_SCORE", defaults.min_score),
            new_track_score: env_parse("VIGIL_TRACKER_NEW_TRACK_SCORE", defaults.new_track_score),
            confirmation_frames: env_parse(
                "VIGIL_TRACKER_CONFIRMATION_FRAMES",
                defaults.confirmation_frames,
            ),
            grace_period_ms: env_parse("VIGIL_TRACKER_GRACE_MS", defaults.grace_period_ms),
            min_area: env_parse("VIGIL_TRACKER_MIN_AREA", defaults.min_area),
            min_aspect: env_parse("VIGIL_TRACKER_MIN_ASPECT", defaults.min_aspect),
            max_aspect: env_parse("VIGIL_TRACKER_MAX_ASPECT", defaults.max_aspect),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Internal record for one tracked identity.
#[derive(Debug, Clone)]
struct TrackedIdentity {
    id: String,
    bbox: BBox,
    score: f32,
    first_seen: i64,
    last_seen: i64,
    /// True only during the frame this identity was last matched
    matched: bool,
    /// Matched-frame counter; resets only by removal
    consecutive_frames: u32,
    /// Latches true at the confirmation bar, never reverts
    is_confirmed: bool,
}

impl TrackedIdentity {
    fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            id: self.id.clone(),
            bbox: self.bbox,
            score: self.score,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            matched: self.matched,
        }
    }
}

/// Multi-person tracker over raw per-frame detections.
///
/// The tracker exclusively owns its identity set; consumers observe it
/// through the published [`TrackingView`], which carries only confirmed
/// identities.
pub struct IdentityTracker {
    config: TrackerConfig,
    /// Live identities in creation order
    identities: Vec<TrackedIdentity>,
    view_tx: watch::Sender<TrackingView>,
}

impl IdentityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let (view_tx, _) = watch::channel(TrackingView::default());
        Self {
            config,
            identities: Vec::new(),
            view_tx,
        }
    }

    /// Subscribe to the published confirmed-identity view.
    pub fn subscribe(&self) -> watch::Receiver<TrackingView> {
        self.view_tx.subscribe()
    }

    /// Latest published view.
    pub fn snapshot(&self) -> TrackingView {
        self.view_tx.borrow().clone()
    }

    /// Total live identities, confirmed or not.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Live identities that have cleared the confirmation bar.
    pub fn confirmed_len(&self) -> usize {
        self.identities.iter().filter(|t| t.is_confirmed).count()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Ingest one frame of detections.
    ///
    /// A frame with zero detections is valid: it only ages and prunes the
    /// existing identities.
    pub fn process_frame(&mut self, detections: &[Detection], now: i64) {
        for identity in &mut self.identities {
            identity.matched = false;
        }

        // Detections are processed in detector output order; no re-sorting.
        let survivors: Vec<&Detection> = detections
            .iter()
            .filter(|d| self.passes_prefilter(d))
            .collect();
        for detection in survivors {
            match self.best_match(&detection.bbox) {
                Some(index) => self.continue_track(index, detection, now),
                None if detection.score >= self.config.new_track_score => {
                    self.open_track(detection, now)
                }
                None => trace!(
                    score = detection.score,
                    "unmatched detection below new-track bar"
                ),
            }
        }

        self.prune(now);
        self.publish(now);
    }

    /// Geometric pre-filter: reject micro-detections, extreme slivers and
    /// low-confidence boxes before any matching happens.
    fn passes_prefilter(&self, detection: &Detection) -> bool {
        if detection.score < self.config.min_score {
            return false;
        }
        if detection.area() < self.config.min_area {
            return false;
        }
        let aspect = detection.aspect_ratio();
        aspect >= self.config.min_aspect && aspect <= self.config.max_aspect
    }

    /// Index of the not-yet-matched identity with the strictly greatest IoU
    /// above the association threshold. Ties keep the earliest-created
    /// identity.
    fn best_match(&self, bbox: &BBox) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (index, identity) in self.identities.iter().enumerate() {
            if identity.matched {
                continue;
            }
            let iou = identity.bbox.iou(bbox);
            if iou <= self.config.iou_threshold {
                continue;
            }
            match best {
                Some((_, best_iou)) if iou <= best_iou => {}
                _ => best = Some((index, iou)),
            }
        }
        best.map(|(index, _)| index)
    }

    fn continue_track(&mut self, index: usize, detection: &Detection, now: i64) {
        let identity = &mut self.identities[index];
        identity.bbox = detection.bbox;
        identity.score = detection.score;
        identity.last_seen = now;
        identity.matched = true;
        identity.consecutive_frames += 1;
        if !identity.is_confirmed && identity.consecutive_frames >= self.config.confirmation_frames
        {
            identity.is_confirmed = true;
            debug!(
                id = %identity.id,
                frames = identity.consecutive_frames,
                "identity confirmed"
            );
        }
    }

    fn open_track(&mut self, detection: &Detection, now: i64) {
        let identity = TrackedIdentity {
            id: new_identity_id(),
            bbox: detection.bbox,
            score: detection.score,
            first_seen: now,
            last_seen: now,
            matched: true,
            consecutive_frames: 1,
            is_confirmed: self.config.confirmation_frames <= 1,
        };
        debug!(id = %identity.id, score = identity.score, "opened track");
        self.identities.push(identity);
    }

    fn prune(&mut self, now: i64) {
        let grace = self.config.grace_period_ms;
        let before = self.identities.len();
        self.identities.retain(|t| now - t.last_seen < grace);
        let pruned = before - self.identities.len();
        if pruned > 0 {
            debug!(pruned, remaining = self.identities.len(), "pruned identities");
        }
    }

    fn publish(&self, now: i64) {
        let view = TrackingView {
            frame_at: now,
            identities: self
                .identities
                .iter()
                .filter(|t| t.is_confirmed)
                .map(TrackedIdentity::snapshot)
                .collect(),
        };
        self.view_tx.send_replace(view);
    }
}
