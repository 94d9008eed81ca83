//! The engine runtime.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use vigil_aggregate::HourlyAggregator;
use vigil_session::SessionManager;
use vigil_storage::SessionStore;
use vigil_tracker::IdentityTracker;
use vigil_vision::{AttributeEngine, Detector, FrameSource};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Current wall-clock time in Unix milliseconds.
fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The presence engine.
///
/// Owns the two loops: a fixed-rate frame loop feeding the tracker, and a
/// strictly serialized analysis loop driving the session manager and the
/// hourly rollover check. All in-memory state is volatile; a restart
/// rebuilds from scratch against the persistent store.
pub struct Engine {
    config: EngineConfig,
    detector: Arc<dyn Detector>,
    frames: Arc<dyn FrameSource>,
    inference: Arc<dyn AttributeEngine>,
    store: Arc<dyn SessionStore>,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        detector: Arc<dyn Detector>,
        frames: Arc<dyn FrameSource>,
        inference: Arc<dyn AttributeEngine>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);
        Self {
            config,
            detector,
            frames,
            inference,
            store,
            shutdown,
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Run until shutdown.
    ///
    /// Stopping halts both loops and flushes every open session through the
    /// normal finalize-or-delete rule, so none is left dangling.
    pub async fn run(&self) -> EngineResult<()> {
        info!(
            detector = self.detector.name(),
            engine = self.inference.name(),
            frame_interval_ms = self.config.frame_interval_ms,
            cycle_interval_ms = self.config.session.cycle_interval_ms,
            "Starting presence engine"
        );

        let mut tracker = IdentityTracker::new(self.config.tracker.clone());
        let view_rx = tracker.subscribe();

        let mut manager = SessionManager::new(
            self.config.session.clone(),
            &self.config.schema,
            self.store.clone(),
            self.inference.clone(),
            self.frames.clone(),
        );
        let aggregator = HourlyAggregator::new(self.store.clone(), self.config.schema.clone());

        // Frame loop: the tracker is exclusively owned by this task; everyone
        // else observes it through the published view.
        let detector = self.detector.clone();
        let frame_interval = Duration::from_millis(self.config.frame_interval_ms);
        let mut frame_shutdown = self.shutdown.subscribe();
        let frame_loop = tokio::spawn(async move {
            let mut ticker = interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = frame_shutdown.changed() => {
                        if *frame_shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match detector.detect().await {
                            Ok(detections) => {
                                tracker.process_frame(&detections, now_ms());
                                counter!("vigil_frames_processed").increment(1);
                            }
                            Err(e) => {
                                warn!(detector = detector.name(), "detection failed: {}", e);
                            }
                        }
                    }
                }
            }
            debug!("frame loop stopped");
        });

        // Analysis loop, in place. The cycle body is awaited to completion
        // before the next tick can fire, so a slow inference call can never
        // overlap with a second one.
        let mut ticker = interval(Duration::from_millis(self.config.session.cycle_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping engine");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let view = view_rx.borrow().clone();
                    let now = now_ms();
                    match manager.run_cycle(&view, now).await {
                        Ok(report) => {
                            if report.opened + report.finalized + report.discarded > 0 {
                                debug!(
                                    opened = report.opened,
                                    finalized = report.finalized,
                                    discarded = report.discarded,
                                    events = report.events_appended,
                                    "analysis cycle complete"
                                );
                            }
                        }
                        Err(e) => error!("analysis cycle failed: {}", e),
                    }

                    if let Err(e) = aggregator.check_rollover(now_ms()).await {
                        error!("rollover check failed: {}", e);
                    }
                }
            }
        }

        // Stop the frame loop, then flush sessions as a forced expiry
        self.shutdown.send_replace(true);
        frame_loop.await.ok();
        manager.shutdown_flush(now_ms()).await?;

        info!("Engine stopped");
        Ok(())
    }
}
