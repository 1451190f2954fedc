//! Tracing setup for binaries built on the seeder.
//!
//! The library only emits events and never installs a subscriber:
//! - `warn`: a validation pass rejected the seed, with its violations.
//! - `info`: a step completed (name, item count) and a run finished.
//! - `debug`: files listed and read, each definition loaded or rejected,
//!   each item applied, step state read and written.
//!
//! Step execution runs inside a span carrying the step order and item type.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a compact stderr subscriber filtered by `RUST_LOG`.
///
/// Defaults to `warn`, so a plain run only reports rejections. Stdout stays
/// free for command output.
///
/// # Example
/// ```bash
/// RUST_LOG=seeder=info seeder run
/// RUST_LOG=seeder=debug seeder validate --order 3
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
