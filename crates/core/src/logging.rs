//! Logging initialization and configuration.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging system with tracing.
///
/// Sets up tracing-subscriber with environment-based filtering (`RUST_LOG`)
/// and a compact development-friendly format.
///
/// # Example
/// ```
/// glint_core::init_logging();
/// tracing::info!("Renderer starting");
/// ```
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,glint=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
