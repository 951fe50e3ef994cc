//! Stable exit codes for redo CLI commands.

/// Every requested target was built (or was an existing source file).
pub const OK: i32 = 0;
/// A build failed: script error, output protocol violation, or I/O error.
pub const FAILED: i32 = 1;
/// No do-file governs the target and the target does not exist.
pub const NO_DOFILE: i32 = 2;
/// Invalid project layout or configuration.
pub const INVALID: i32 = 3;
