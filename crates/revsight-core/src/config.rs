use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RevsightError;
use crate::types::VcsKind;

/// Top-level configuration loaded from `.revsight.toml`.
///
/// Supports layered resolution: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use revsight_core::RevsightConfig;
///
/// let config = RevsightConfig::default();
/// assert_eq!(config.reviewers.num_reviewers, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevsightConfig {
    /// Ranking and display settings.
    #[serde(default)]
    pub reviewers: ReviewersConfig,
    /// Version-control backend settings.
    #[serde(default)]
    pub backend: BackendConfig,
}

impl RevsightConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Io`] if the file cannot be read, or
    /// [`RevsightError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use revsight_core::RevsightConfig;
    /// use std::path::Path;
    ///
    /// let config = RevsightConfig::from_file(Path::new(".revsight.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, RevsightError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use revsight_core::RevsightConfig;
    ///
    /// let toml = r#"
    /// [reviewers]
    /// num_reviewers = 5
    /// "#;
    /// let config = RevsightConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.reviewers.num_reviewers, 5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, RevsightError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject settings that can never produce a report.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Config`] when `num_reviewers` is zero.
    pub fn validate(&self) -> Result<(), RevsightError> {
        if self.reviewers.num_reviewers == 0 {
            return Err(RevsightError::Config(
                "num_reviewers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Ranking and display configuration.
///
/// # Examples
///
/// ```
/// use revsight_core::ReviewersConfig;
///
/// let config = ReviewersConfig::default();
/// assert_eq!(config.num_reviewers, 3);
/// assert!(config.strip_domains.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewersConfig {
    /// Candidates shown per scope (default: 3).
    #[serde(default = "default_num_reviewers")]
    pub num_reviewers: usize,
    /// Email domains removed from author ids when rendering, e.g. `"example.com"`.
    #[serde(default)]
    pub strip_domains: Vec<String>,
    /// Glob patterns for files that are never attributed.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_num_reviewers() -> usize {
    3
}

impl Default for ReviewersConfig {
    fn default() -> Self {
        Self {
            num_reviewers: default_num_reviewers(),
            strip_domains: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// Backend selection and invocation limits.
///
/// # Examples
///
/// ```
/// use revsight_core::{BackendConfig, VcsKind};
///
/// let config = BackendConfig::default();
/// assert_eq!(config.vcs, VcsKind::Auto);
/// assert_eq!(config.timeout_secs, 120);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend to use (default: auto-detect).
    #[serde(default)]
    pub vcs: VcsKind,
    /// Base revision; the backend default is used when unset.
    pub revision: Option<String>,
    /// Timeout for each external VCS call in seconds; `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Revisions skipped during annotation.
    #[serde(default)]
    pub ignore_revisions: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            vcs: VcsKind::default(),
            revision: None,
            timeout_secs: default_timeout_secs(),
            ignore_revisions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = RevsightConfig::default();
        assert_eq!(config.reviewers.num_reviewers, 3);
        assert!(config.reviewers.exclude.is_empty());
        assert_eq!(config.backend.vcs, VcsKind::Auto);
        assert!(config.backend.revision.is_none());
        assert_eq!(config.backend.timeout_secs, 120);
        assert!(config.backend.ignore_revisions.is_empty());
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[reviewers]
num_reviewers = 2
strip_domains = ["example.com"]
exclude = ["*.lock"]

[backend]
vcs = "hg"
revision = "tip"
timeout_secs = 30
ignore_revisions = ["abc123"]
"#;
        let config = RevsightConfig::from_toml(toml).unwrap();
        assert_eq!(config.reviewers.num_reviewers, 2);
        assert_eq!(config.reviewers.strip_domains, vec!["example.com"]);
        assert_eq!(config.reviewers.exclude, vec!["*.lock"]);
        assert_eq!(config.backend.vcs, VcsKind::Hg);
        assert_eq!(config.backend.revision.as_deref(), Some("tip"));
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.backend.ignore_revisions, vec!["abc123"]);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RevsightConfig::from_toml("").unwrap();
        assert_eq!(config.reviewers.num_reviewers, 3);
        assert_eq!(config.backend.timeout_secs, 120);
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(RevsightConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn zero_reviewers_is_rejected() {
        let mut config = RevsightConfig::default();
        config.reviewers.num_reviewers = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RevsightError::Config(_)));
    }
}
