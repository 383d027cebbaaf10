//! Ambient logging setup
//!
//! Stderr-only `tracing` subscriber: an `EnvFilter` plus a compact `fmt`
//! layer. No file appender — this crate persists no cross-run state.
//! `--debug` raises the default filter from `info` to `debug`.

use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber. Safe to call once at
/// process startup; a second call is a no-op (the underlying
/// `tracing_subscriber::fmt().try_init()` fails silently if a global
/// default is already set, which only matters in tests that call this
/// more than once).
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_does_not_panic_on_repeated_calls() {
        init_logging(false);
        init_logging(true);
    }
}
