//! Subscriber setup for the crate's `tracing` output.
//!
//! The library only emits events. Test binaries call [`init`] once to see
//! them; `RUST_LOG` is honoured.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "echo=info";

/// Install a fmt subscriber filtered by `RUST_LOG` (or [`DEFAULT_FILTER`]).
///
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_thread_names(true)
        .try_init()
        .is_ok()
}

/// Install a fmt subscriber with explicit filter directives
pub fn init_with_filter(directives: &str) -> bool {
    fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_test_writer()
        .with_thread_names(true)
        .try_init()
        .is_ok()
}

/// Install a JSON-lines subscriber, for CI log collectors
pub fn init_json(directives: &str) -> bool {
    fmt()
        .json()
        .with_env_filter(EnvFilter::new(directives))
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
