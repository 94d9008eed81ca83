//! Per-frame identity tracking.
//!
//! This crate provides:
//! - Greedy best-IoU association of raw detections to tracked identities
//! - Two-threshold score hysteresis and frame-count confirmation
//! - Grace-period pruning of unseen identities
//! - A continuously published view of the confirmed identity set

pub mod tracker;

pub use tracker::{IdentityTracker, TrackerConfig};
