//! Tracing setup for the redo binary.
//!
//! # Separation of Concerns
//!
//! - **Debug tracing**: `RUST_LOG=redo=debug` shows the `@sh ...` invocation
//!   of every do-file and the resolver's outcome.
//! - **Verbose build log**: `--verbose` raises the default level to `info`,
//!   which prints one line per target (`<depth><parent> => <target> (<dofile>)`).
//!
//! Script stdout/stderr are never routed through tracing.

use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn`, or `info` when `verbose` is set.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=redo=debug redo build out.txt
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .without_time()
                .with_target(false)
                .compact(),
        )
        .init();
}
