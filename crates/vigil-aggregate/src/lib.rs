//! Hourly session aggregation.
//!
//! This crate provides:
//! - Pure per-session summarization: categorical modes and a term-frequency
//!   map over the free-text attributes
//! - The wall-clock hour-rollover trigger with a persisted watermark

pub mod error;
pub mod rollover;
pub mod summary;

pub use error::{AggregateError, AggregateResult};
pub use rollover::{hour_floor, HourlyAggregator, HOUR_MS};
pub use summary::{compute_mode, summarize_session, term_frequency};
