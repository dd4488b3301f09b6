//! Path normalization between user input, repository-relative VCS
//! arguments, and the absolute keys used by line sets and annotations.

use std::path::{Path, PathBuf};

use revsight_core::RevsightError;

/// Resolve `path` against `base` and canonicalize as far as the filesystem allows.
///
/// Deleted files no longer exist, so their parent directory is canonicalized
/// instead; if that fails too the joined path is returned unchanged.
///
/// # Examples
///
/// ```
/// use revsight_vcs::paths::absolutize;
/// use std::path::Path;
///
/// let abs = absolutize(Path::new("/no/such/base"), Path::new("file.rs"));
/// assert_eq!(abs, Path::new("/no/such/base/file.rs"));
/// ```
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    if let Ok(canonical) = joined.canonicalize() {
        return canonical;
    }

    match (joined.parent(), joined.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or(joined),
        _ => joined,
    }
}

/// `path` relative to `root`.
///
/// # Errors
///
/// Returns [`RevsightError::Backend`] when `path` lies outside the repository.
pub fn relative_to(root: &Path, path: &Path) -> Result<PathBuf, RevsightError> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| {
            RevsightError::Backend(format!(
                "{} is outside the repository at {}",
                path.display(),
                root.display()
            ))
        })
}
