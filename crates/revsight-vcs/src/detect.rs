//! Repository detection for `--vcs auto`.

use std::path::{Path, PathBuf};

use revsight_core::{RevsightError, VcsKind};

/// Find the nearest enclosing repository of `start`.
///
/// Walks `start` and its ancestors; the first directory holding `.git`
/// (directory or worktree file) or `.hg` wins.
///
/// # Errors
///
/// Returns [`RevsightError::NoRepository`] when neither is found.
pub fn detect_repository(start: &Path) -> Result<(VcsKind, PathBuf), RevsightError> {
    for dir in start.ancestors() {
        if dir.join(".git").exists() {
            return Ok((VcsKind::Git, dir.to_path_buf()));
        }
        if dir.join(".hg").is_dir() {
            return Ok((VcsKind::Hg, dir.to_path_buf()));
        }
    }
    Err(RevsightError::NoRepository(start.to_path_buf()))
}
