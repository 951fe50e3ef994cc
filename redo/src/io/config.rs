//! Redo configuration stored under `.redo/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Directory that marks a project root.
pub const REDO_DIR: &str = ".redo";
/// Config file name inside [`REDO_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Redo configuration (TOML).
///
/// Immutable once loaded: the resolver, executor and commit steps all receive
/// it by reference. Missing fields default to plain `/bin/sh -e` behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RedoConfig {
    /// Shell used to run do-files.
    pub shell: PathBuf,

    /// One extra shell flag passed after `-e` (e.g. `x` or `-v`).
    pub shell_args: Option<String>,

    /// Log one line per target and include the full shell command in errors.
    pub verbose: bool,
}

impl Default for RedoConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/sh"),
            shell_args: None,
            verbose: false,
        }
    }
}

impl RedoConfig {
    pub fn validate(&self) -> Result<()> {
        if self.shell.as_os_str().is_empty() {
            return Err(anyhow!("shell must be non-empty"));
        }
        if let Some(args) = &self.shell_args
            && (args.trim().is_empty() || args.split_whitespace().count() != 1)
        {
            return Err(anyhow!("shell_args must be a single flag, got {args:?}"));
        }
        Ok(())
    }

    /// The extra shell flag, normalized to start with `-`.
    pub fn extra_shell_flag(&self) -> Option<String> {
        let args = self.shell_args.as_deref()?.trim();
        if args.is_empty() {
            return None;
        }
        if args.starts_with('-') {
            Some(args.to_string())
        } else {
            Some(format!("-{args}"))
        }
    }
}

/// Path of the config file for a project root.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(REDO_DIR).join(CONFIG_FILE)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RedoConfig::default()`.
pub fn load_config(path: &Path) -> Result<RedoConfig> {
    if !path.exists() {
        let cfg = RedoConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RedoConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RedoConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

/// Find the nearest ancestor of `start` (inclusive) that contains `.redo/`.
pub fn find_root(start: &Path) -> Result<PathBuf> {
    let start = start
        .canonicalize()
        .with_context(|| format!("resolve {}", start.display()))?;
    start
        .ancestors()
        .find(|dir| dir.join(REDO_DIR).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            anyhow!(
                "no {REDO_DIR} directory found above {} (run `redo init`)",
                start.display()
            )
        })
}

/// Create `.redo/` with a default config in `root`.
///
/// Fails if the config already exists unless `force` is set.
pub fn init_project(root: &Path, force: bool) -> Result<PathBuf> {
    let path = config_path(root);
    if path.exists() && !force {
        return Err(anyhow!(
            "redo init: {} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    write_config(&path, &RedoConfig::default())?;
    Ok(path)
}
