//! Tracing Setup
//!
//! Console tracing for the core library. Binaries embedding the core wire
//! their own exporters; the core only emits `tracing` events.
//!
//! # Configuration
//!
//! - `RUST_LOG`: standard env-filter directives (default: `info`)

use tracing_subscriber::EnvFilter;

/// Initialize console tracing with an environment filter.
///
/// Safe to call more than once: only the first call installs a subscriber
/// (later calls, e.g. from parallel tests, are no-ops).
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}
