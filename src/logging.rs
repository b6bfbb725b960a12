//! # Structured Logging Module
//!
//! Console-oriented structured logging for debugging batch dispatch and the
//! resilience components. Honors `RUST_LOG`, defaults to `info`, and switches
//! to JSON output when `COPYMILL_LOG_FORMAT=json` so deployed instances can
//! ship machine-readable logs.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging. Safe to call more than once; later calls
/// (and an already-installed global subscriber) are no-ops.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let json_output = std::env::var("COPYMILL_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let init_result = if json_output {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(filter),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_filter(filter),
                )
                .try_init()
        };

        if init_result.is_err() {
            // A global subscriber is already set (likely by the embedding
            // application) - continue with the existing one
            tracing::debug!("Global tracing subscriber already initialized");
        }
    });
}
