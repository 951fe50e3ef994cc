//! Orchestration for building a single target.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::core::commit::{CommitOutcome, classify};
use crate::core::env::ParentContext;
use crate::error::BuildError;
use crate::io::commit::{apply, inspect};
use crate::io::config::RedoConfig;
use crate::io::dofile::{DoFile, resolve};
use crate::io::output::Output;
use crate::io::shell::{Invocation, ScriptRunner, execute};
use crate::target::Target;

/// Everything a build needs besides the target itself.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub config: RedoConfig,
    /// Depth and parent inherited from an enclosing redo process.
    pub parent: ParentContext,
}

impl BuildContext {
    /// Context for this process: `config` plus the inherited redo environment.
    pub fn from_env(config: RedoConfig) -> Self {
        Self {
            config,
            parent: ParentContext::from_vars(std::env::vars_os()),
        }
    }
}

/// How a target ended up in its final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// No do-file applies, but the target exists: it is a source file.
    Source,
    /// A do-file ran and its output was committed.
    Built(CommitOutcome),
}

/// Result of building a single target.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub dofile: DoFile,
    pub outcome: BuildOutcome,
}

/// Build `target`: resolve its do-file, run it, commit its output.
///
/// A target with no do-file is fine if it already exists (a source file), and
/// an error otherwise.
#[instrument(skip_all, fields(target = %target))]
pub fn build<R: ScriptRunner>(
    target: &Target,
    ctx: &BuildContext,
    runner: &R,
) -> Result<BuildReport, BuildError> {
    let dofile = resolve(target)?;
    if !dofile.is_found() {
        let target_path = target.full_path();
        if target_path.exists() && !target.is_task() {
            debug!("no do file, treating as source");
            return Ok(BuildReport {
                dofile,
                outcome: BuildOutcome::Source,
            });
        }
        return Err(BuildError::NoDoFile {
            target: target.to_string(),
            missing: dofile.missing,
        });
    }

    let outcome = run_dofile(target, &dofile, ctx, runner)?;
    Ok(BuildReport {
        dofile,
        outcome: BuildOutcome::Built(outcome),
    })
}

/// Run an already resolved do-file for `target` and commit its output.
///
/// The execution is equivalent to
///
/// ```text
/// sh -e target.ext.do target.ext target target.ext.dst.tmp > target.ext.out.tmp
/// ```
///
/// A well behaved do-file writes to stdout or to `$3`, not both. Both sinks are
/// removed before returning unless one was renamed onto the target.
#[instrument(skip_all, fields(target = %target, dofile = %dofile.name))]
pub fn run_dofile<R: ScriptRunner>(
    target: &Target,
    dofile: &DoFile,
    ctx: &BuildContext,
    runner: &R,
) -> Result<CommitOutcome, BuildError> {
    let target_path = target.full_path();
    fs::create_dir_all(target.dir()).map_err(|source| BuildError::Io {
        target: target.to_string(),
        action: "create directory",
        path: target.dir().to_path_buf(),
        source,
    })?;

    // Task stdout is never redirected.
    let capture = if target.is_task() {
        None
    } else {
        let out = Output::capture(&target_path)
            .map_err(|source| sink_error(target, "create capture sink", &target_path, source))?;
        Some(out)
    };
    let explicit = Output::explicit(&target_path)
        .map_err(|source| sink_error(target, "reserve $3 sink", &target_path, source))?;

    let invocation = Invocation::new(
        &ctx.config,
        &ctx.parent,
        target,
        dofile,
        explicit.path(),
    );

    if ctx.config.verbose {
        info!(
            "{}{} ({})",
            ctx.parent.log_prefix(),
            target.rel(&target_path).display(),
            target.rel(&dofile.path()).display()
        );
    }

    execute(
        runner,
        &invocation,
        capture.as_ref(),
        target,
        ctx.config.verbose,
    )?;

    let state = inspect(target, capture.as_ref(), &explicit)?;
    let outcome = classify(target.is_task(), state);
    debug!(?state, ?outcome, "classified do file output");
    apply(outcome, target, dofile, capture, explicit)?;
    Ok(outcome)
}

fn sink_error(
    target: &Target,
    action: &'static str,
    target_path: &Path,
    source: io::Error,
) -> BuildError {
    BuildError::Io {
        target: target.to_string(),
        action,
        path: PathBuf::from(target_path),
        source,
    }
}
