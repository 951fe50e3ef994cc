//! Output sinks of a do-file run.
//!
//! Every sink owns its temp path through a [`TempPath`] guard, so the file is
//! removed on every exit path (errors and unwinding included) unless it was
//! promoted onto the target with [`Output::promote`].

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::Stdio;

use tempfile::TempPath;

/// Suffix of the sink that captures the script's stdout.
pub const CAPTURE_SUFFIX: &str = ".out.tmp";
/// Suffix of the path handed to the script as `$3`.
pub const EXPLICIT_SUFFIX: &str = ".dst.tmp";

/// How a sink receives data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// We hold the handle the child's stdout is redirected to.
    Capture,
    /// The child may create and write the path on its own.
    Explicit,
}

/// One output channel of a do-file run.
#[derive(Debug)]
pub struct Output {
    kind: SinkKind,
    file: Option<File>,
    path: TempPath,
}

impl Output {
    /// Create (or truncate) the capture sink next to `target_path`.
    pub fn capture(target_path: &Path) -> io::Result<Self> {
        let path = sink_path(target_path, CAPTURE_SUFFIX);
        let file = File::create(&path)?;
        Ok(Self {
            kind: SinkKind::Capture,
            file: Some(file),
            path: TempPath::try_from_path(path)?,
        })
    }

    /// Reserve the `$3` path next to `target_path`.
    ///
    /// A leftover from an interrupted attempt is removed first, so existence
    /// after the run means this run's script created it.
    pub fn explicit(target_path: &Path) -> io::Result<Self> {
        let path = sink_path(target_path, EXPLICIT_SUFFIX);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        Ok(Self {
            kind: SinkKind::Explicit,
            file: None,
            path: TempPath::try_from_path(path)?,
        })
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stdio for the child's stdout, sharing our capture handle.
    pub fn stdio(&self) -> io::Result<Stdio> {
        match &self.file {
            Some(file) => Ok(Stdio::from(file.try_clone()?)),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "explicit sink has no handle to redirect into",
            )),
        }
    }

    /// Current size of the sink, or `None` if it does not exist.
    ///
    /// The explicit sink was written by another process, so it is always
    /// re-stated by path rather than through a handle.
    pub fn size(&self) -> io::Result<Option<u64>> {
        match (&self.kind, &self.file) {
            (SinkKind::Capture, Some(file)) => Ok(Some(file.metadata()?.len())),
            _ => match fs::metadata(&self.path) {
                Ok(meta) => Ok(Some(meta.len())),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err),
            },
        }
    }

    /// Atomically rename the sink onto `dest`, disarming its cleanup.
    ///
    /// On failure the sink is still removed when the guard drops.
    pub fn promote(self, dest: &Path) -> io::Result<()> {
        drop(self.file);
        self.path.persist(dest).map_err(|err| err.error)
    }
}

fn sink_path(target_path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut path = target_path.as_os_str().to_owned();
    path.push(suffix);
    path.into()
}
