use std::fmt;
use std::path::{Path, PathBuf};

use revsight_core::{FileLineSet, RevsightError};
use revsight_difflens::filter::PathFilter;
use revsight_vcs::VersionControlBackend;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, Grouping, Tallies};
use crate::rank::rank_authors;
use crate::report::{AttributionStats, ReviewerReport, ScopeReport};
use crate::resolve::resolve_annotations;

/// Which lines are attributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Base-revision lines touched by working-tree changes.
    #[default]
    Diff,
    /// Every line of each file at the base revision.
    WholeFile,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Diff => write!(f, "diff"),
            Scope::WholeFile => write!(f, "whole-file"),
        }
    }
}

/// Inputs for one attribution run.
///
/// # Examples
///
/// ```
/// use revsight_ownership::pipeline::{AttributionRequest, Scope};
///
/// let request = AttributionRequest::default();
/// assert!(request.files.is_empty());
/// assert_eq!(request.scope, Scope::Diff);
/// assert_eq!(request.num_reviewers, 3);
/// ```
#[derive(Debug, Clone)]
pub struct AttributionRequest {
    /// Absolute paths to analyze; empty means every pending modified or deleted file.
    pub files: Vec<PathBuf>,
    /// Base revision; the backend default when `None`.
    pub revision: Option<String>,
    pub scope: Scope,
    pub grouping: Grouping,
    /// Candidates kept per tally; must be at least 1.
    pub num_reviewers: usize,
    /// Files dropped before any backend call.
    pub filter: PathFilter,
}

impl Default for AttributionRequest {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            revision: None,
            scope: Scope::default(),
            grouping: Grouping::default(),
            num_reviewers: 3,
            filter: PathFilter::default(),
        }
    }
}

/// Run the whole pipeline: line extraction, annotation, aggregation, ranking.
///
/// Either the full report is produced or an error is returned; nothing is
/// retried.
///
/// # Errors
///
/// Returns [`RevsightError::Config`] for `num_reviewers == 0` before any
/// backend call, and propagates backend and diff-protocol errors.
pub async fn attribute_reviewers<B: VersionControlBackend>(
    backend: &B,
    request: &AttributionRequest,
) -> Result<ReviewerReport, RevsightError> {
    if request.num_reviewers == 0 {
        return Err(RevsightError::Config(
            "num_reviewers must be at least 1".into(),
        ));
    }

    let revision = request
        .revision
        .clone()
        .unwrap_or_else(|| backend.default_revision().to_string());

    let files = if request.files.is_empty() {
        backend.pending_files(&revision).await?
    } else {
        request.files.clone()
    };
    let files = request.filter.retain(files, backend.root());

    let lines: FileLineSet = match request.scope {
        Scope::Diff => backend.modified_lines(&files, &revision).await?,
        Scope::WholeFile => backend.whole_file_lines(&files, &revision).await?,
    };
    let annotations = resolve_annotations(backend, &lines, &revision).await?;

    let scopes = match aggregate(&lines, &annotations, request.grouping) {
        Tallies::Global(tally) if tally.is_empty() => Vec::new(),
        Tallies::Global(tally) => vec![ScopeReport {
            path: None,
            total_lines: tally.total(),
            reviewers: rank_authors(&tally, request.num_reviewers),
        }],
        Tallies::PerFile(per_file) => per_file
            .into_iter()
            .filter(|(_, tally)| !tally.is_empty())
            .map(|(path, tally)| ScopeReport {
                path: Some(
                    path.strip_prefix(backend.root())
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| path.clone()),
                ),
                total_lines: tally.total(),
                reviewers: rank_authors(&tally, request.num_reviewers),
            })
            .collect(),
    };

    Ok(ReviewerReport {
        scope: request.scope,
        grouping: request.grouping,
        scopes,
        stats: AttributionStats {
            backend: backend.name().to_string(),
            revision,
            files_considered: files.len(),
            files_with_lines: lines.len(),
            changed_lines: lines.total_lines(),
            files_annotated: annotations.len(),
        },
    })
}
