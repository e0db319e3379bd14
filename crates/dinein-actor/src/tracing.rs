//! # Observability & Tracing
//!
//! Structured logging for every binary and test that uses the state actors.
//!
//! The subscriber uses a compact format without module targets; actors log their entity
//! type as a field instead. Levels come from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run     # lifecycle, placed orders, status changes
//! RUST_LOG=debug cargo run    # every apply, snapshot and poll
//! ```
//!
//! What gets logged:
//! - **Actor lifecycle**: start, reset, shutdown with store size
//! - **Applies**: the action at `debug`, rejections at `warn` with the entity error
//! - **Pollers** (in the `dinein` crate): stale responses at `debug`, failures at `warn`

/// Installs the global subscriber. Panics if one is already installed.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Like [`setup_tracing`] but safe to call repeatedly (e.g. from several tests).
pub fn try_setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_test_writer()
        .try_init();
}
