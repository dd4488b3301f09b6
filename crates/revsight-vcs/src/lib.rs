//! Version-control backends for reviewer attribution.
//!
//! The rest of revsight only talks to [`VersionControlBackend`]. Two
//! implementations exist with identical contracts: [`git::GitBackend`] and
//! [`hg::HgBackend`]. [`Backend`] picks one at runtime.
//!
//! Raw VCS text (diffs, blame) is parsed here, at the boundary; callers only
//! ever see [`FileLineSet`] and [`AnnotationTable`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use revsight_core::{AnnotationTable, BackendConfig, FileLineSet, RevsightError, VcsKind};

pub mod detect;
pub mod git;
pub mod hg;
pub mod paths;
pub mod porcelain;
mod process;

/// Settings shared by every backend invocation.
///
/// # Examples
///
/// ```
/// use revsight_core::BackendConfig;
/// use revsight_vcs::BackendOptions;
///
/// let opts = BackendOptions::from_config(&BackendConfig::default());
/// assert_eq!(opts.timeout.map(|t| t.as_secs()), Some(120));
/// assert!(opts.ignore_revisions.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Limit for each external process; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Revisions skipped during annotation.
    pub ignore_revisions: Vec<String>,
}

impl BackendOptions {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
            ignore_revisions: config.ignore_revisions.clone(),
        }
    }
}

/// Line-set and authorship extraction from an external VCS.
///
/// All paths, in and out, are absolute paths inside [`root`](Self::root).
/// No operation mutates the repository. Any failure is fatal for the run
/// and yields no partial result.
#[allow(async_fn_in_trait)]
pub trait VersionControlBackend {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Repository root (canonical, absolute).
    fn root(&self) -> &Path;

    /// Base revision used when the caller gives none.
    fn default_revision(&self) -> &'static str;

    /// Files modified or deleted in the working tree relative to `revision`.
    async fn pending_files(&self, revision: &str) -> Result<Vec<PathBuf>, RevsightError>;

    /// `{1..=N}` for every file, where `N` is its line count at `revision`.
    async fn whole_file_lines(
        &self,
        files: &[PathBuf],
        revision: &str,
    ) -> Result<FileLineSet, RevsightError>;

    /// Base-revision lines touched by working-tree changes to modified or
    /// deleted files. Added files and added lines contribute nothing.
    async fn modified_lines(
        &self,
        files: &[PathBuf],
        revision: &str,
    ) -> Result<FileLineSet, RevsightError>;

    /// Last-modifying author of every line of each path at `revision`.
    async fn annotate(
        &self,
        paths: &[PathBuf],
        revision: &str,
    ) -> Result<AnnotationTable, RevsightError>;
}

/// Runtime-selected backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Git(git::GitBackend),
    Hg(hg::HgBackend),
}

impl Backend {
    /// Open the backend of `kind` for the repository containing `path`.
    ///
    /// [`VcsKind::Auto`] uses the nearest enclosing `.git` or `.hg`.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::NoRepository`] or [`RevsightError::Backend`]
    /// when no usable repository is found.
    pub fn open(kind: VcsKind, path: &Path, options: BackendOptions) -> Result<Self, RevsightError> {
        let kind = match kind {
            VcsKind::Auto => detect::detect_repository(path)?.0,
            other => other,
        };
        match kind {
            VcsKind::Hg => Ok(Backend::Hg(hg::HgBackend::open(path, options)?)),
            _ => Ok(Backend::Git(git::GitBackend::open(path, options)?)),
        }
    }
}

impl VersionControlBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Git(b) => b.name(),
            Backend::Hg(b) => b.name(),
        }
    }

    fn root(&self) -> &Path {
        match self {
            Backend::Git(b) => b.root(),
            Backend::Hg(b) => b.root(),
        }
    }

    fn default_revision(&self) -> &'static str {
        match self {
            Backend::Git(b) => b.default_revision(),
            Backend::Hg(b) => b.default_revision(),
        }
    }

    async fn pending_files(&self, revision: &str) -> Result<Vec<PathBuf>, RevsightError> {
        match self {
            Backend::Git(b) => b.pending_files(revision).await,
            Backend::Hg(b) => b.pending_files(revision).await,
        }
    }

    async fn whole_file_lines(
        &self,
        files: &[PathBuf],
        revision: &str,
    ) -> Result<FileLineSet, RevsightError> {
        match self {
            Backend::Git(b) => b.whole_file_lines(files, revision).await,
            Backend::Hg(b) => b.whole_file_lines(files, revision).await,
        }
    }

    async fn modified_lines(
        &self,
        files: &[PathBuf],
        revision: &str,
    ) -> Result<FileLineSet, RevsightError> {
        match self {
            Backend::Git(b) => b.modified_lines(files, revision).await,
            Backend::Hg(b) => b.modified_lines(files, revision).await,
        }
    }

    async fn annotate(
        &self,
        paths: &[PathBuf],
        revision: &str,
    ) -> Result<AnnotationTable, RevsightError> {
        match self {
            Backend::Git(b) => b.annotate(paths, revision).await,
            Backend::Hg(b) => b.annotate(paths, revision).await,
        }
    }
}
