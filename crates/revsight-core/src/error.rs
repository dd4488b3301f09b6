use std::path::PathBuf;

/// Errors that can occur while attributing reviewers.
///
/// Every variant is fatal for a run: there is no partial report. Lines
/// without blame data are not errors; they are counted under
/// [`UNKNOWN_AUTHOR`](crate::UNKNOWN_AUTHOR).
///
/// # Examples
///
/// ```
/// use revsight_core::RevsightError;
///
/// let err = RevsightError::Backend("git blame exited with status 128".into());
/// assert!(err.to_string().contains("status 128"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RevsightError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration, detected before any backend call.
    #[error("configuration error: {0}")]
    Config(String),

    /// An external diff/annotate invocation failed.
    #[error("backend invocation failed: {0}")]
    #[diagnostic(help("check that the revision exists and the VCS tool is installed"))]
    Backend(String),

    /// A hunk header was seen before any file header, or could not be read.
    #[error("malformed diff: {0}")]
    #[diagnostic(help("the VCS produced diff output in an unexpected format"))]
    MalformedDiff(String),

    /// Blame/annotate output could not be understood.
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// No supported repository was found.
    #[error("not inside a git or mercurial repository: {}", .0.display())]
    #[diagnostic(help("run from a checkout or pass --repo <path>"))]
    NoRepository(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RevsightError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = RevsightError::Config("num_reviewers must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "configuration error: num_reviewers must be at least 1"
        );
    }

    #[test]
    fn malformed_diff_displays_message() {
        let err = RevsightError::MalformedDiff("hunk header before file header".into());
        assert_eq!(
            err.to_string(),
            "malformed diff: hunk header before file header"
        );
    }

    #[test]
    fn no_repository_shows_path() {
        let err = RevsightError::NoRepository(PathBuf::from("/tmp/nowhere"));
        assert!(err.to_string().contains("/tmp/nowhere"));
    }
}
