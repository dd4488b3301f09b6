//! Fetching annotations for the files in a line set.

use std::path::{Path, PathBuf};

use revsight_core::{AnnotationTable, FileLineSet, RevsightError};
use revsight_vcs::VersionControlBackend;

/// Annotate exactly the files present in `lines` at `revision`, in one
/// batched backend call.
///
/// Cost is proportional to file size rather than diff size, so this runs
/// once per invocation.
///
/// # Errors
///
/// Propagates any backend failure.
pub async fn resolve_annotations<B: VersionControlBackend>(
    backend: &B,
    lines: &FileLineSet,
    revision: &str,
) -> Result<AnnotationTable, RevsightError> {
    let paths: Vec<PathBuf> = lines.paths().map(Path::to_path_buf).collect();
    backend.annotate(&paths, revision).await
}
