//! Do-file resolution: the most specific script governing a target.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::core::names::candidates;
use crate::error::BuildError;
use crate::target::Target;

/// The do-file chosen for a target, plus everything probed before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoFile {
    /// Directory that contains the script. Empty if none was found.
    pub dir: PathBuf,
    /// Script file name, e.g. `default.gz.do`. Empty if none was found.
    pub name: String,
    /// Path from `dir` back down to the target's directory.
    pub rel_dir: PathBuf,
    /// More specific candidates that were probed and absent, in probe order.
    pub missing: Vec<PathBuf>,
}

impl DoFile {
    pub fn is_found(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Express `path` (relative to the target's directory) relative to `dir`.
    pub fn rel_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.rel_dir.join(path)
    }
}

/// Search the target's directory, then each ancestor up to the target's root,
/// for the first existing candidate do-file.
///
/// Not finding a script is not an error: the returned [`DoFile`] is empty
/// apart from `missing`. Only probe failures (e.g. permission denied) error.
#[instrument(skip_all, fields(target = %target))]
pub fn resolve(target: &Target) -> Result<DoFile, BuildError> {
    let names = candidates(target.name());
    let mut missing = Vec::new();
    // Base names of the directories left behind, innermost first.
    let mut left_behind: Vec<String> = Vec::new();
    let mut dir = target.dir().to_path_buf();

    loop {
        for name in &names {
            let path = dir.join(name);
            let exists = path.try_exists().map_err(|source| BuildError::Probe {
                target: target.to_string(),
                path: path.clone(),
                source,
            })?;
            if exists {
                debug!(dofile = %path.display(), missing = missing.len(), "do file found");
                return Ok(DoFile {
                    dir,
                    name: name.clone(),
                    rel_dir: join_offset(&left_behind),
                    missing,
                });
            }
            missing.push(path);
        }

        if dir == target.root() {
            break;
        }
        let Some(parent) = dir.parent().map(Path::to_path_buf) else {
            break;
        };
        if let Some(base) = dir.file_name() {
            left_behind.push(base.to_string_lossy().into_owned());
        }
        dir = parent;
    }

    debug!(missing = missing.len(), "no do file found");
    Ok(DoFile {
        missing,
        ..DoFile::default()
    })
}

/// Rebuild the downward path from the ascent record.
fn join_offset(left_behind: &[String]) -> PathBuf {
    left_behind.iter().rev().collect()
}
