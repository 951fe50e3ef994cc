//! Build targets as seen by the execution core.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};

/// Prefix that marks a target name as a task (phony target).
pub const TASK_PREFIX: char = '@';

/// A single build target: a name inside a directory, bounded by a project root.
///
/// The root is the topmost directory the do-file search may visit. Targets are
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    dir: PathBuf,
    root: PathBuf,
}

impl Target {
    /// Build a target from a path (absolute or relative to the current
    /// directory) and the project root.
    ///
    /// Fails if the path has no file name or lies outside `root`.
    pub fn new(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .with_context(|| format!("resolve root {}", root.display()))?;

        let path = absolutize(path.as_ref())?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("target {} has no usable file name", path.display()))?
            .to_string();
        let dir = path
            .parent()
            .ok_or_else(|| anyhow!("target {} has no parent directory", path.display()))?;
        // Symlinked ancestors (e.g. a tempdir) must compare equal to the canonical root.
        let dir = match dir.canonicalize() {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => dir.to_path_buf(),
            Err(err) => {
                return Err(err).with_context(|| format!("resolve directory {}", dir.display()));
            }
        };

        if !dir.starts_with(&root) {
            return Err(anyhow!(
                "target {} is outside root {}",
                dir.join(&name).display(),
                root.display()
            ));
        }

        Ok(Self { name, dir, root })
    }

    /// File name of the target (no directory).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory that contains the target.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Topmost directory the do-file search may visit.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn full_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Tasks produce no artifact; only their side effects matter.
    pub fn is_task(&self) -> bool {
        self.name.starts_with(TASK_PREFIX)
    }

    /// Express `path` relative to the project root, for display.
    pub fn rel(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rel(&self.full_path()).display())
    }
}

/// Make `path` absolute and drop `.`/`..` components lexically.
fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("read current directory")?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_into_dir_and_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().canonicalize().expect("canonical root");
        std::fs::create_dir_all(root.join("src")).expect("mkdir");

        let target = Target::new(root.join("src/out.txt"), &root).expect("target");
        assert_eq!(target.name(), "out.txt");
        assert_eq!(target.dir(), root.join("src"));
        assert_eq!(target.root(), root);
        assert_eq!(target.full_path(), root.join("src/out.txt"));
        assert_eq!(target.to_string(), "src/out.txt");
    }

    #[test]
    fn parent_components_are_normalized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().canonicalize().expect("canonical root");

        let target = Target::new(root.join("a/../b/./x.o"), &root).expect("target");
        assert_eq!(target.full_path(), root.join("b/x.o"));
    }

    #[test]
    fn rejects_target_outside_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("project");
        std::fs::create_dir_all(&root).expect("mkdir");

        let err = Target::new(temp.path().join("elsewhere.txt"), &root).unwrap_err();
        assert!(err.to_string().contains("outside root"));
    }

    #[test]
    fn missing_directory_keeps_lexical_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().canonicalize().expect("canonical root");

        let target = Target::new(root.join("build/obj/x.o"), &root).expect("target");
        assert_eq!(target.dir(), root.join("build/obj"));
    }

    #[test]
    fn directory_under_regular_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().canonicalize().expect("canonical root");
        std::fs::write(root.join("plain"), "").expect("write");

        let err = Target::new(root.join("plain/sub/x.o"), &root).unwrap_err();
        assert!(err.to_string().contains("resolve directory"), "{err:#}");
    }

    #[test]
    fn at_prefix_marks_task() {
        let temp = tempfile::tempdir().expect("tempdir");
        let task = Target::new(temp.path().join("@clean"), temp.path()).expect("task");
        let file = Target::new(temp.path().join("clean"), temp.path()).expect("file");
        assert!(task.is_task());
        assert!(!file.is_task());
    }
}
