//! Test-only helpers: scratch projects and scripted do-file runners.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::io::config::init_project;
use crate::io::output::{CAPTURE_SUFFIX, EXPLICIT_SUFFIX, Output};
use crate::io::shell::{Invocation, ScriptRunner};
use crate::target::Target;

/// A temporary project root with `.redo/` initialized.
pub struct TestProject {
    _temp: TempDir,
    root: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let root = temp.path().canonicalize().context("canonicalize tempdir")?;
        init_project(&root, false)?;
        Ok(Self { _temp: temp, root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Write a do-file script. Do-files are run via `sh`, so no exec bit is
    /// needed; it is set anyway to mirror hand-written projects.
    pub fn write_do(&self, rel: &str, script: &str) -> Result<PathBuf> {
        let path = self.write(rel, script)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("chmod {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.root.join(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    pub fn target(&self, rel: &str) -> Result<Target> {
        Target::new(self.root.join(rel), &self.root)
    }

    /// Every leftover sink file under the project, relative to the root.
    pub fn temp_files(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        collect_temp_files(&self.root, &self.root, &mut found)?;
        found.sort();
        Ok(found)
    }
}

fn collect_temp_files(root: &Path, dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_temp_files(root, &path, found)?;
            continue;
        }
        let name = path.to_string_lossy();
        if name.ends_with(CAPTURE_SUFFIX) || name.ends_with(EXPLICIT_SUFFIX) {
            found.push(path.strip_prefix(root)?.to_path_buf());
        }
    }
    Ok(())
}

/// One predetermined do-file run.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRun {
    /// Bytes "printed" to stdout (dropped for tasks, whose stdout is inherited).
    pub stdout: Option<String>,
    /// Bytes written to `$3`; `Some("")` creates an empty file.
    pub explicit: Option<String>,
    pub exit_code: i32,
}

impl ScriptedRun {
    pub fn stdout(contents: &str) -> Self {
        Self {
            stdout: Some(contents.to_string()),
            ..Self::default()
        }
    }

    pub fn explicit(contents: &str) -> Self {
        Self {
            explicit: Some(contents.to_string()),
            ..Self::default()
        }
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }
}

/// [`ScriptRunner`] that replays queued [`ScriptedRun`]s instead of spawning.
pub struct ScriptedRunner {
    queue: RefCell<VecDeque<ScriptedRun>>,
    invocations: RefCell<Vec<(Invocation, bool)>>,
}

impl ScriptedRunner {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            queue: RefCell::new(runs.into()),
            invocations: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.invocations.borrow().len()
    }

    /// Invocations seen so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .borrow()
            .iter()
            .map(|(invocation, _)| invocation.clone())
            .collect()
    }

    /// Whether stdout was captured for each call.
    pub fn captured_flags(&self) -> Vec<bool> {
        self.invocations
            .borrow()
            .iter()
            .map(|(_, captured)| *captured)
            .collect()
    }
}

impl ScriptRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation, capture: Option<&Output>) -> io::Result<ExitStatus> {
        self.invocations
            .borrow_mut()
            .push((invocation.clone(), capture.is_some()));
        let run = self
            .queue
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| io::Error::other("no scripted run left"))?;

        if let (Some(bytes), Some(out)) = (&run.stdout, capture) {
            let mut file = OpenOptions::new().append(true).open(out.path())?;
            file.write_all(bytes.as_bytes())?;
        }
        if let Some(bytes) = &run.explicit {
            fs::write(invocation.explicit_path(), bytes)?;
        }
        Ok(ExitStatus::from_raw(run.exit_code << 8))
    }
}
