//! Target-scoped build errors.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Coarse classification of a [`BuildError`], for callers that branch on the
/// failure category (exit codes, retry policy) rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A filesystem check failed while searching for a do-file.
    Probe,
    /// The script could not be started or exited non-zero.
    Run,
    /// The script broke the single-output contract.
    Violation,
    /// An existing target could not be removed after an empty build.
    StaleCleanup,
    /// No do-file governs the target and the target does not exist.
    NoDoFile,
    /// Any other filesystem failure while preparing or committing outputs.
    Io,
}

/// Errors produced while building a single target.
///
/// Every variant names the target (relative to the project root) so messages
/// stay meaningful when printed far from the build that produced them.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{target}: probe {}: {source}", .path.display())]
    Probe {
        target: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The shell could not be started. `invocation` is only set in verbose mode.
    #[error("{target}: {}{source}", prefix(.invocation))]
    Spawn {
        target: String,
        invocation: Option<String>,
        #[source]
        source: io::Error,
    },

    /// The script ran and failed. `invocation` is only set in verbose mode.
    #[error("{target}: {}{status}", prefix(.invocation))]
    Exit {
        target: String,
        invocation: Option<String>,
        status: ExitStatus,
    },

    #[error("{target}: task do file {} unexpectedly wrote to $3", .dofile.display())]
    TaskWroteExplicit { target: String, dofile: PathBuf },

    #[error("{target}: do file {} wrote to stdout and to file $3", .dofile.display())]
    DualOutput { target: String, dofile: PathBuf },

    #[error("{target}: remove stale target: {source}")]
    StaleCleanup {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("{target}: no do file found ({} candidates checked)", .missing.len())]
    NoDoFile {
        target: String,
        missing: Vec<PathBuf>,
    },

    #[error("{target}: {action} {}: {source}", .path.display())]
    Io {
        target: String,
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Probe { .. } => ErrorKind::Probe,
            Self::Spawn { .. } | Self::Exit { .. } => ErrorKind::Run,
            Self::TaskWroteExplicit { .. } | Self::DualOutput { .. } => ErrorKind::Violation,
            Self::StaleCleanup { .. } => ErrorKind::StaleCleanup,
            Self::NoDoFile { .. } => ErrorKind::NoDoFile,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Name of the target the error belongs to.
    pub fn target(&self) -> &str {
        match self {
            Self::Probe { target, .. }
            | Self::Spawn { target, .. }
            | Self::Exit { target, .. }
            | Self::TaskWroteExplicit { target, .. }
            | Self::DualOutput { target, .. }
            | Self::StaleCleanup { target, .. }
            | Self::NoDoFile { target, .. }
            | Self::Io { target, .. } => target,
        }
    }
}

fn prefix(invocation: &Option<String>) -> String {
    match invocation {
        Some(line) => format!("{line}: "),
        None => String::new(),
    }
}
