//! Execution core of a redo-style incremental build tool.
//!
//! Building one target means three sequential steps:
//!
//! 1. find the most specific do-file for the target ([`io::dofile`]),
//! 2. run it under `/bin/sh -e` with the redo argument contract ([`io::shell`]),
//! 3. promote exactly one of the script's outputs onto the target path
//!    ([`io::commit`]).
//!
//! The crate keeps the same split between pure and side-effecting code:
//!
//! - **[`core`]**: Pure, deterministic logic (candidate names, basenames,
//!   commit classification, environment merging). No I/O.
//! - **[`io`]**: Filesystem probes, temp sinks, subprocess execution.
//!
//! [`build`] wires the steps together for a single [`target::Target`].

pub mod build;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod target;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
