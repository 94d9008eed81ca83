//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Call once at startup. Honors `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
