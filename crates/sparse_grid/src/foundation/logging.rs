//! Logging utilities
//!
//! The grid logs through the `log` facade. Binaries pick the backend; `init`
//! wires up `env_logger` so `RUST_LOG=sparse_grid=trace` shows per-object moves.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize logging, falling back to `filter` when `RUST_LOG` is unset
pub fn init_with_default_filter(filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

/// Initialize logging, tolerating an already-installed logger
///
/// Useful from tests and tools that may run after another logger was set up.
pub fn try_init() -> bool {
    env_logger::builder().is_test(true).try_init().is_ok()
}
