//! The session lifecycle manager.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use vigil_models::{new_session_id, AttributeSchema, SessionEvent, SessionRecord, TrackingView};
use vigil_storage::SessionStore;
use vigil_vision::{
    build_attribute_prompt, AnalyzeRequest, AttributeEngine, FrameSource, IdentityRef,
};

use crate::error::SessionResult;

/// Session manager configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between analysis cycles (ms)
    pub cycle_interval_ms: u64,
    /// How long a disappeared identity keeps its session open (ms).
    /// Must stay strictly greater than one full inference cycle so a call
    /// still in flight when the identity vanishes can land in its session.
    pub grace_timeout_ms: i64,
    /// Sessions shorter than this are discarded as transient noise (ms)
    pub min_session_ms: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 5_000,
            grace_timeout_ms: 15_000,
            min_session_ms: 10_000,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cycle_interval_ms: std::env::var("VIGIL_CYCLE_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cycle_interval_ms),
            grace_timeout_ms: std::env::var("VIGIL_SESSION_GRACE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.grace_timeout_ms),
            min_session_ms: std::env::var("VIGIL_MIN_SESSION_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_session_ms),
        }
    }
}

/// In-memory state of one open session.
#[derive(Debug, Clone)]
struct OpenSession {
    session_id: String,
    first_seen: i64,
    /// Last cycle the identity appeared in the confirmed view
    last_seen: i64,
}

/// What one analysis cycle did, for logging and tests.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub opened: u32,
    pub finalized: u32,
    pub discarded: u32,
    pub events_appended: u32,
    pub inference_failed: bool,
}

/// Correlates the tracker's confirmed view with sessions and inference.
///
/// Exactly one session is open per currently tracked confirmed identity,
/// keyed by identity id in memory and by session id in the store. The
/// manager is driven by a single sequential loop, so at most one inference
/// call is ever in flight.
pub struct SessionManager {
    config: SessionConfig,
    store: Arc<dyn SessionStore>,
    engine: Arc<dyn AttributeEngine>,
    frames: Arc<dyn FrameSource>,
    schema: AttributeSchema,
    /// Rendered once from the attribute schema
    prompt: String,
    /// Open sessions by identity id
    open: HashMap<String, OpenSession>,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        schema: &AttributeSchema,
        store: Arc<dyn SessionStore>,
        engine: Arc<dyn AttributeEngine>,
        frames: Arc<dyn FrameSource>,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            frames,
            schema: schema.clone(),
            prompt: build_attribute_prompt(schema),
            open: HashMap::new(),
        }
    }

    /// Number of currently open sessions.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Session id currently attached to an identity, if any.
    pub fn session_for(&self, identity_id: &str) -> Option<&str> {
        self.open.get(identity_id).map(|s| s.session_id.as_str())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run one analysis cycle against the tracker's current view.
    ///
    /// Storage failures propagate; inference and frame-capture failures are
    /// logged and absorbed so the loop can keep running.
    pub async fn run_cycle(
        &mut self,
        view: &TrackingView,
        now: i64,
    ) -> SessionResult<CycleReport> {
        let mut report = CycleReport::default();

        self.reconcile_absent(view, now, &mut report).await?;

        // Presence refreshes the session; first presence opens one.
        for snapshot in &view.identities {
            match self.open.get_mut(&snapshot.id) {
                Some(open) => open.last_seen = now,
                None => {
                    let session_id = new_session_id();
                    self.store
                        .start_session(&SessionRecord::open(session_id.as_str(), now))
                        .await?;
                    info!(
                        session_id = %session_id,
                        identity_id = %snapshot.id,
                        "session opened"
                    );
                    counter!("vigil_sessions_opened").increment(1);
                    self.open.insert(
                        snapshot.id.clone(),
                        OpenSession {
                            session_id,
                            first_seen: now,
                            last_seen: now,
                        },
                    );
                    report.opened += 1;
                }
            }
        }

        // Confirmed-but-unmatched identities are present (their session just
        // refreshed) but not eligible for this cycle's batched call.
        let eligible: Vec<IdentityRef> = view
            .identities
            .iter()
            .filter(|s| s.matched)
            .map(|s| IdentityRef {
                id: s.id.clone(),
                bbox: s.bbox,
            })
            .collect();

        if !eligible.is_empty() {
            self.run_inference(eligible, now, &mut report).await?;
        }

        Ok(report)
    }

    /// Close every session whose identity has been absent past the grace
    /// timeout.
    async fn reconcile_absent(
        &mut self,
        view: &TrackingView,
        now: i64,
        report: &mut CycleReport,
    ) -> SessionResult<()> {
        let expired: Vec<String> = self
            .open
            .iter()
            .filter(|(id, open)| {
                !view.contains(id) && now - open.last_seen >= self.config.grace_timeout_ms
            })
            .map(|(id, _)| id.clone())
            .collect();

        for identity_id in expired {
            if let Some(open) = self.open.remove(&identity_id) {
                self.close_session(&open, report).await?;
            }
        }
        Ok(())
    }

    /// Finalize or delete one closing session.
    async fn close_session(
        &self,
        open: &OpenSession,
        report: &mut CycleReport,
    ) -> SessionResult<()> {
        let duration_ms = open.last_seen - open.first_seen;
        if duration_ms >= self.config.min_session_ms {
            self.store
                .heartbeat(&open.session_id, open.last_seen)
                .await?;
            info!(session_id = %open.session_id, duration_ms, "session finalized");
            counter!("vigil_sessions_finalized").increment(1);
            report.finalized += 1;
        } else {
            self.store.delete_session(&open.session_id).await?;
            debug!(session_id = %open.session_id, duration_ms, "session discarded");
            counter!("vigil_sessions_discarded").increment(1);
            report.discarded += 1;
        }
        Ok(())
    }

    /// Issue the cycle's single batched inference call and append the
    /// per-identity results to whichever sessions are still open.
    async fn run_inference(
        &mut self,
        eligible: Vec<IdentityRef>,
        now: i64,
        report: &mut CycleReport,
    ) -> SessionResult<()> {
        let frame = match self.frames.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("frame capture failed: {}", e);
                counter!("vigil_inference_failures").increment(1);
                report.inference_failed = true;
                return Ok(());
            }
        };

        let request = AnalyzeRequest {
            identities: eligible,
            image: frame.data,
            prompt: self.prompt.clone(),
            schema: self.schema.clone(),
        };

        let subjects = match self.engine.analyze(&request).await {
            Ok(subjects) => subjects,
            Err(e) => {
                warn!(engine = self.engine.name(), "inference failed: {}", e);
                counter!("vigil_inference_failures").increment(1);
                report.inference_failed = true;
                return Ok(());
            }
        };

        for subject in subjects {
            // An identity that disappeared mid-inference does not reopen a
            // session; its result is dropped.
            let Some(open) = self.open.get(&subject.id) else {
                debug!(identity_id = %subject.id, "dropping result for closed session");
                continue;
            };
            let event = SessionEvent {
                timestamp: now,
                identity_id: subject.id.clone(),
                prompt: request.prompt.clone(),
                payload: subject.to_payload(),
            };
            self.store.append_event(&open.session_id, &event).await?;
            report.events_appended += 1;
        }

        Ok(())
    }

    /// Treat shutdown as immediate forced expiry of every open session.
    pub async fn shutdown_flush(&mut self, _now: i64) -> SessionResult<CycleReport> {
        let mut report = CycleReport::default();
        let draining: Vec<OpenSession> = self.open.drain().map(|(_, open)| open).collect();
        for open in &draining {
            self.close_session(open, &mut report).await?;
        }
        if report.finalized + report.discarded > 0 {
            info!(
                finalized = report.finalized,
                discarded = report.discarded,
                "flushed open sessions"
            );
        }
        Ok(report)
    }
}
