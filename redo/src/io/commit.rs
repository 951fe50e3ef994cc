//! Applying a commit decision to the target path.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::commit::{CommitOutcome, SinkState, Violation};
use crate::error::BuildError;
use crate::io::dofile::DoFile;
use crate::io::output::Output;
use crate::target::Target;

/// Read the post-run state of both sinks.
pub fn inspect(
    target: &Target,
    capture: Option<&Output>,
    explicit: &Output,
) -> Result<SinkState, BuildError> {
    let capture_len = match capture {
        Some(out) => size_of(target, out)?.unwrap_or(0),
        None => 0,
    };
    let explicit_len = size_of(target, explicit)?;
    Ok(SinkState {
        capture_len,
        explicit_len,
    })
}

/// Carry out `outcome`: at most one rename or one delete touches the target.
///
/// Sinks that are not promoted are dropped here, which removes them.
pub fn apply(
    outcome: CommitOutcome,
    target: &Target,
    dofile: &DoFile,
    capture: Option<Output>,
    explicit: Output,
) -> Result<(), BuildError> {
    let target_path = target.full_path();
    match outcome {
        CommitOutcome::PromoteCapture => {
            let out = capture.ok_or_else(|| BuildError::Io {
                target: target.to_string(),
                action: "promote missing capture sink for",
                path: target_path.clone(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })?;
            promote(target, out, &target_path)
        }
        CommitOutcome::PromoteExplicit => promote(target, explicit, &target_path),
        CommitOutcome::DeleteStale => remove_stale(target, &target_path),
        CommitOutcome::NoOp => Ok(()),
        CommitOutcome::Violation(violation) => {
            let dofile = target.rel(&dofile.path());
            warn!(
                target = %target,
                dofile = %dofile.display(),
                ?violation,
                "do file broke the output contract"
            );
            Err(match violation {
                Violation::TaskWroteExplicit => BuildError::TaskWroteExplicit {
                    target: target.to_string(),
                    dofile,
                },
                Violation::DualOutput => BuildError::DualOutput {
                    target: target.to_string(),
                    dofile,
                },
            })
        }
    }
}

fn promote(target: &Target, out: Output, target_path: &Path) -> Result<(), BuildError> {
    let kind = out.kind();
    let from = out.path().to_path_buf();
    out.promote(target_path).map_err(|source| BuildError::Io {
        target: target.to_string(),
        action: "rename output onto target from",
        path: from,
        source,
    })?;
    debug!(?kind, "promoted output");
    Ok(())
}

fn remove_stale(target: &Target, target_path: &Path) -> Result<(), BuildError> {
    match fs::remove_file(target_path) {
        Ok(()) => {
            debug!("removed stale target");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(BuildError::StaleCleanup {
            target: target.to_string(),
            source,
        }),
    }
}

fn size_of(target: &Target, out: &Output) -> Result<Option<u64>, BuildError> {
    out.size().map_err(|source| BuildError::Io {
        target: target.to_string(),
        action: "stat output",
        path: out.path().to_path_buf(),
        source,
    })
}
