//! Tracing and logging setup shared by binaries and test harnesses that drive
//! the product store.
//!
//! The store itself never installs a subscriber; it reports through the
//! observer it was given (by default one that forwards to `tracing`).

/// Initialize process-wide tracing from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&ObservabilityConfig::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use tracing::{LogFormat, ObservabilityConfig};
