//! Structured logging setup for embedding applications
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the embedding application's decision.  This helper wires up a sensible
//! default for applications that do not already carry their own tracing
//! stack.

use crate::error::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes a global tracing subscriber for the engine's log events.
///
/// The filter honors `RUST_LOG` when set and falls back to `level`
/// otherwise.  Calling this twice returns an error from the underlying
/// registry; embedders with their own subscriber should skip this entirely.
///
/// # Arguments
///
/// * `level` - Fallback filter directive, e.g. `"info"` or `"authflow=debug"`.
///
/// # Examples
///
/// ```no_run
/// authflow::logging::init_logging("info").unwrap();
/// ```
pub fn init_logging(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let stdout_layer = fmt::layer().with_target(true).with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_init_is_rejected() {
        // No other test in this binary installs a global subscriber.
        assert!(init_logging("info").is_ok());
        assert!(init_logging("info").is_err());
    }
}
