//! Runtime wiring for the Vigil presence engine.
//!
//! This crate provides:
//! - The engine composing tracker, session manager and aggregator
//! - The fixed-rate frame loop and the serialized analysis loop
//! - Graceful shutdown with session flush
//! - Configuration and tracing setup

pub mod config;
pub mod error;
pub mod runtime;
pub mod telemetry;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use runtime::Engine;
pub use telemetry::init_tracing;
