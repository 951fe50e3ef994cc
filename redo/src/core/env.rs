//! Environment propagated from a build to the do-files it runs.

use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Path of the target that started the current do-file, relative to its script.
pub const REDO_PARENT: &str = "REDO_PARENT";
/// Directory of the do-file that is currently running.
pub const REDO_PARENT_DIR: &str = "REDO_PARENT_DIR";
/// Nesting marker: one character per level of recursive builds.
pub const REDO_DEPTH: &str = "REDO_DEPTH";

const DEPTH_MARKER: char = ' ';

/// Depth and parent inherited from the process that invoked this build.
///
/// Both are empty for a top-level build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentContext {
    pub depth: String,
    pub parent: String,
}

impl ParentContext {
    /// Pick `REDO_DEPTH` and `REDO_PARENT` out of an environment snapshot.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut ctx = Self::default();
        for (key, value) in vars {
            if key == REDO_DEPTH {
                ctx.depth = value.to_string_lossy().into_owned();
            } else if key == REDO_PARENT {
                ctx.parent = value.to_string_lossy().into_owned();
            }
        }
        ctx
    }

    /// Depth string handed to the child: one marker deeper than ours.
    pub fn child_depth(&self) -> String {
        let mut depth = self.depth.clone();
        depth.push(DEPTH_MARKER);
        depth
    }

    /// Prefix for the human build log: `<depth><parent> => `.
    pub fn log_prefix(&self) -> String {
        if self.parent.is_empty() {
            self.depth.clone()
        } else {
            format!("{}{} => ", self.depth, self.parent)
        }
    }
}

/// The propagated variables for one do-file run, in a fixed order.
pub fn propagated_vars(
    parent: &ParentContext,
    target_rel: &Path,
    script_dir: &Path,
) -> [(&'static str, OsString); 3] {
    [
        (REDO_PARENT, target_rel.as_os_str().to_owned()),
        (REDO_PARENT_DIR, script_dir.as_os_str().to_owned()),
        (REDO_DEPTH, OsString::from(parent.child_depth())),
    ]
}

/// Overlay `additions` onto `inherited`.
///
/// An existing entry with the same key is replaced in place; otherwise the
/// pair is appended. Additions are applied in the order given, so the result
/// depends only on the inputs.
pub fn merge_env(
    mut inherited: Vec<(OsString, OsString)>,
    additions: &[(&'static str, OsString)],
) -> Vec<(OsString, OsString)> {
    for (key, value) in additions {
        let key = OsStr::new(key);
        match inherited.iter_mut().find(|entry| entry.0.as_os_str() == key) {
            Some(entry) => entry.1 = value.clone(),
            None => inherited.push((key.to_owned(), value.clone())),
        }
    }
    inherited
}
