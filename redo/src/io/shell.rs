//! Do-file invocation under the redo argument contract.
//!
//! The [`ScriptRunner`] trait decouples the commit protocol from actual process
//! spawning. Production code uses [`ShellRunner`]; tests use scripted runners
//! that write predetermined output into the sinks.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, error, instrument};

use crate::core::env::{ParentContext, merge_env, propagated_vars};
use crate::core::names::basename;
use crate::error::BuildError;
use crate::io::config::RedoConfig;
use crate::io::dofile::DoFile;
use crate::io::output::Output;
use crate::target::Target;

/// A fully prepared do-file command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Shell executable.
    pub program: PathBuf,
    /// `-e [extra] <dofile> <target> <basename> <$3>`.
    pub args: Vec<OsString>,
    /// The do-file's directory.
    pub cwd: PathBuf,
    /// Variables layered over the inherited environment, in a fixed order.
    pub env: Vec<(&'static str, OsString)>,
}

impl Invocation {
    pub fn new(
        config: &RedoConfig,
        parent: &ParentContext,
        target: &Target,
        dofile: &DoFile,
        explicit_path: &Path,
    ) -> Self {
        let rel_target = dofile.rel_path(target.name());
        let rel_base = dofile.rel_path(basename(target.name(), &dofile.name));

        let mut args: Vec<OsString> = vec!["-e".into()];
        if let Some(flag) = config.extra_shell_flag() {
            args.push(flag.into());
        }
        args.push(OsString::from(&dofile.name));
        args.push(rel_target.clone().into_os_string());
        args.push(rel_base.into_os_string());
        args.push(explicit_path.as_os_str().to_owned());

        Self {
            program: config.shell.clone(),
            args,
            cwd: dofile.dir.clone(),
            env: propagated_vars(parent, &rel_target, &dofile.dir).to_vec(),
        }
    }

    /// The full command line, for verbose error messages.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// The `$3` path handed to the script.
    pub fn explicit_path(&self) -> &Path {
        self.args.last().map(Path::new).unwrap_or_else(|| Path::new(""))
    }

    /// Debug trace form: `@sh <args...> $3`.
    pub fn trace_line(&self) -> String {
        let shown = &self.args[..self.args.len().saturating_sub(1)];
        let shown: Vec<_> = shown.iter().map(|arg| arg.to_string_lossy()).collect();
        format!("@sh {} $3", shown.join(" "))
    }
}

/// Abstraction over do-file execution backends.
pub trait ScriptRunner {
    /// Run the do-file to completion.
    ///
    /// `capture` is the sink stdout must be redirected into; `None` for task
    /// targets, whose stdout is inherited.
    fn run(&self, invocation: &Invocation, capture: Option<&Output>) -> io::Result<ExitStatus>;
}

/// Runner that spawns the configured shell and waits for it.
pub struct ShellRunner;

impl ScriptRunner for ShellRunner {
    fn run(&self, invocation: &Invocation, capture: Option<&Output>) -> io::Result<ExitStatus> {
        let stdout = match capture {
            Some(out) => out.stdio()?,
            None => Stdio::inherit(),
        };
        let env = merge_env(std::env::vars_os().collect(), &invocation.env);

        Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .status()
    }
}

/// Run `invocation` and turn spawn failures and non-zero exits into
/// target-scoped errors.
///
/// The command line is only included in the error when `verbose` is set.
#[instrument(skip_all, fields(target = %target))]
pub fn execute<R: ScriptRunner>(
    runner: &R,
    invocation: &Invocation,
    capture: Option<&Output>,
    target: &Target,
    verbose: bool,
) -> Result<(), BuildError> {
    debug!("{}", invocation.trace_line());
    let shown = || verbose.then(|| invocation.command_line());

    let status = match runner.run(invocation, capture) {
        Ok(status) => status,
        Err(source) => {
            error!(err = %source, "failed to spawn do file");
            return Err(BuildError::Spawn {
                target: target.to_string(),
                invocation: shown(),
                source,
            });
        }
    };

    if !status.success() {
        debug!(exit_code = ?status.code(), "do file failed");
        return Err(BuildError::Exit {
            target: target.to_string(),
            invocation: shown(),
            status,
        });
    }
    Ok(())
}
