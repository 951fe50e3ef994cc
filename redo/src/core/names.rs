//! Do-file naming rules: candidate generation and `$2` basename derivation.

/// Extension shared by every do-file.
pub const DO_SUFFIX: &str = ".do";

const DEFAULT_STEM: &str = "default";

/// Candidate do-file names for `target_name`, most specific first.
///
/// A name with `n` dot-separated components yields `n + 1` candidates: the
/// exact `<name>.do`, then `default.<tail>.do` for each shorter tail, ending
/// with `default.do`. The list is the same in every directory searched.
///
/// ```
/// use redo::core::names::candidates;
///
/// assert_eq!(
///     candidates("data.tar.gz"),
///     vec!["data.tar.gz.do", "default.tar.gz.do", "default.gz.do", "default.do"],
/// );
/// ```
pub fn candidates(target_name: &str) -> Vec<String> {
    let parts: Vec<&str> = target_name.split('.').collect();
    let mut names = Vec::with_capacity(parts.len() + 1);
    names.push(format!("{target_name}{DO_SUFFIX}"));
    for i in 0..parts.len() {
        let mut segments = vec![DEFAULT_STEM];
        segments.extend_from_slice(&parts[i + 1..]);
        names.push(format!("{}{DO_SUFFIX}", segments.join(".")));
    }
    names
}

/// Extension tail encoded by a generic do-file name, including its leading dot.
///
/// `default.gz.do` encodes `.gz`, `default.do` encodes the empty tail. Returns
/// `None` for names that are not generic do-files.
pub fn default_tail(dofile_name: &str) -> Option<&str> {
    let tail = dofile_name
        .strip_prefix(DEFAULT_STEM)?
        .strip_suffix(DO_SUFFIX)?;
    if tail.is_empty() || tail.starts_with('.') {
        Some(tail)
    } else {
        None
    }
}

/// The `$2` argument for a target built by `dofile_name`, before it is made
/// relative to the do-file's directory.
///
/// - `default.<tail>.do` strips `.<tail>` from the target name.
/// - `default.do` strips only the last extension.
/// - any other do-file leaves the name unchanged.
pub fn basename(target_name: &str, dofile_name: &str) -> String {
    match default_tail(dofile_name) {
        Some("") => match target_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => target_name.to_string(),
        },
        Some(tail) => target_name
            .strip_suffix(tail)
            .unwrap_or(target_name)
            .to_string(),
        None => target_name.to_string(),
    }
}
