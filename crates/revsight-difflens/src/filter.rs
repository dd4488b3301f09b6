//! Glob-based exclusion of files that should never be attributed.
//!
//! Lockfiles and generated sources churn constantly and their blame says
//! little about who should review a change. Patterns are matched against
//! the repository-relative path and against the bare file name.

use std::path::{Path, PathBuf};

use revsight_core::{ReviewersConfig, RevsightError};

/// Files to leave out before any backend call.
///
/// # Examples
///
/// ```
/// use revsight_difflens::filter::PathFilter;
///
/// let filter = PathFilter::new(&["*.lock".to_string(), "gen/**".to_string()]).unwrap();
/// assert!(filter.should_skip("Cargo.lock"));
/// assert!(filter.should_skip("gen/proto/api.rs"));
/// assert!(!filter.should_skip("src/main.rs"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<glob::Pattern>,
}

impl PathFilter {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Config`] for an invalid glob.
    pub fn new(patterns: &[String]) -> Result<Self, RevsightError> {
        let patterns = patterns
            .iter()
            .map(|pat| {
                glob::Pattern::new(pat)
                    .map_err(|e| RevsightError::Config(format!("invalid exclude pattern '{pat}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Create a filter from the `[reviewers]` configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Config`] for an invalid glob.
    pub fn from_config(config: &ReviewersConfig) -> Result<Self, RevsightError> {
        Self::new(&config.exclude)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check a repository-relative path.
    pub fn should_skip(&self, path: &str) -> bool {
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.patterns
            .iter()
            .any(|p| p.matches(path) || p.matches(&file_name))
    }

    /// Keep the absolute `paths` whose location under `root` is not excluded.
    ///
    /// Paths outside `root` are matched as given.
    pub fn retain(&self, paths: Vec<PathBuf>, root: &Path) -> Vec<PathBuf> {
        if self.is_empty() {
            return paths;
        }
        paths
            .into_iter()
            .filter(|p| {
                let rel = p.strip_prefix(root).unwrap_or(p);
                !self.should_skip(&rel.to_string_lossy())
            })
            .collect()
    }
}
