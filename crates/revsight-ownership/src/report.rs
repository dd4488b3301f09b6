//! Rendering ranked reviewers as text, Markdown, or JSON.

use std::fmt::Write as _;
use std::path::PathBuf;

use revsight_core::{OutputFormat, RevsightError};
use serde::Serialize;

use crate::aggregate::Grouping;
use crate::pipeline::Scope;
use crate::rank::RankedAuthor;

/// Ranked reviewers for one tally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeReport {
    /// File path relative to the repository root; `None` for the global tally.
    pub path: Option<PathBuf>,
    /// Lines attributed in this scope (the percentage denominator).
    pub total_lines: u32,
    /// Top candidates, best first.
    pub reviewers: Vec<RankedAuthor>,
}

/// Statistics about an attribution run.
///
/// # Examples
///
/// ```
/// use revsight_ownership::report::AttributionStats;
///
/// let stats = AttributionStats {
///     backend: "git".into(),
///     revision: "HEAD".into(),
///     files_considered: 4,
///     files_with_lines: 3,
///     changed_lines: 12,
///     files_annotated: 3,
/// };
/// assert_eq!(stats.files_considered - stats.files_with_lines, 1);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionStats {
    /// Backend that produced the data.
    pub backend: String,
    /// Revision diffed and annotated against.
    pub revision: String,
    /// Files handed to the backend after exclusion.
    pub files_considered: usize,
    /// Files the line set reported (including files with zero lines).
    pub files_with_lines: usize,
    /// Lines attributed across all files.
    pub changed_lines: usize,
    /// Files annotated.
    pub files_annotated: usize,
}

/// The full result of one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerReport {
    pub scope: Scope,
    pub grouping: Grouping,
    /// One entry for global grouping, one per file otherwise.
    pub scopes: Vec<ScopeReport>,
    pub stats: AttributionStats,
}

/// Cosmetic identity normalization applied only when rendering.
///
/// # Examples
///
/// ```
/// use revsight_ownership::report::DisplayOptions;
///
/// let display = DisplayOptions::new(vec!["example.com".into()]);
/// assert_eq!(display.display_name("alice@example.com"), "alice");
/// assert_eq!(display.display_name("alice@elsewhere.org"), "alice@elsewhere.org");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    strip_domains: Vec<String>,
}

impl DisplayOptions {
    pub fn new(strip_domains: Vec<String>) -> Self {
        let strip_domains = strip_domains
            .into_iter()
            .map(|d| d.trim_start_matches('@').to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self { strip_domains }
    }

    /// `author` with the first matching `@domain` suffix removed.
    pub fn display_name<'a>(&self, author: &'a str) -> &'a str {
        for domain in &self.strip_domains {
            if let Some(local) = author
                .strip_suffix(domain.as_str())
                .and_then(|rest| rest.strip_suffix('@'))
            {
                if !local.is_empty() {
                    return local;
                }
            }
        }
        author
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReviewer<'a> {
    author: &'a str,
    display_name: &'a str,
    lines: u32,
    percent: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonScope<'a> {
    path: Option<&'a PathBuf>,
    total_lines: u32,
    reviewers: Vec<JsonReviewer<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    scope: Scope,
    grouping: Grouping,
    scopes: Vec<JsonScope<'a>>,
    stats: &'a AttributionStats,
}

impl ReviewerReport {
    /// Render in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Serialization`] if JSON encoding fails.
    pub fn render(&self, format: OutputFormat, display: &DisplayOptions) -> Result<String, RevsightError> {
        match format {
            OutputFormat::Text => Ok(self.to_text(display)),
            OutputFormat::Markdown => Ok(self.to_markdown(display)),
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(&self.json_view(display))?;
                json.push('\n');
                Ok(json)
            }
        }
    }

    /// Plain text: `<author>: <n> lines (<pct>%)` per reviewer, each file
    /// block preceded by `--- <path>` in per-file grouping.
    pub fn to_text(&self, display: &DisplayOptions) -> String {
        let mut out = String::new();
        for scope in &self.scopes {
            if let Some(path) = &scope.path {
                let _ = writeln!(out, "--- {}", path.display());
            }
            for reviewer in &scope.reviewers {
                let _ = writeln!(
                    out,
                    "{}: {} lines ({:.1}%)",
                    display.display_name(&reviewer.author),
                    reviewer.lines,
                    reviewer.percent
                );
            }
        }
        out
    }

    /// GitHub-flavored Markdown, one table per scope.
    pub fn to_markdown(&self, display: &DisplayOptions) -> String {
        let mut out = String::from("# Suggested Reviewers\n\n");
        let what = match self.scope {
            Scope::Diff => "changed lines",
            Scope::WholeFile => "lines",
        };
        let _ = writeln!(
            out,
            "**Base revision:** `{}` ({} {what})\n",
            self.stats.revision, self.stats.changed_lines
        );

        if self.scopes.is_empty() {
            out.push_str("No lines to attribute.\n");
            return out;
        }

        for scope in &self.scopes {
            if let Some(path) = &scope.path {
                let _ = writeln!(out, "## `{}`\n", path.display());
            }
            out.push_str("| Reviewer | Lines | Share |\n");
            out.push_str("|----------|-------|-------|\n");
            for reviewer in &scope.reviewers {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:.1}% |",
                    display.display_name(&reviewer.author),
                    reviewer.lines,
                    reviewer.percent
                );
            }
            out.push('\n');
        }
        out
    }

    fn json_view<'a>(&'a self, display: &DisplayOptions) -> JsonReport<'a> {
        JsonReport {
            scope: self.scope,
            grouping: self.grouping,
            scopes: self
                .scopes
                .iter()
                .map(|scope| JsonScope {
                    path: scope.path.as_ref(),
                    total_lines: scope.total_lines,
                    reviewers: scope
                        .reviewers
                        .iter()
                        .map(|r| JsonReviewer {
                            author: &r.author,
                            display_name: display.display_name(&r.author),
                            lines: r.lines,
                            percent: r.percent,
                        })
                        .collect(),
                })
                .collect(),
            stats: &self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> AttributionStats {
        AttributionStats {
            backend: "git".into(),
            revision: "HEAD".into(),
            files_considered: 2,
            files_with_lines: 2,
            changed_lines: 5,
            files_annotated: 2,
        }
    }

    fn reviewer(author: &str, lines: u32, percent: f64) -> RankedAuthor {
        RankedAuthor {
            author: author.into(),
            lines,
            percent,
        }
    }

    fn global_report() -> ReviewerReport {
        ReviewerReport {
            scope: Scope::Diff,
            grouping: Grouping::Global,
            scopes: vec![ScopeReport {
                path: None,
                total_lines: 5,
                reviewers: vec![
                    reviewer("bob@example.com", 3, 60.0),
                    reviewer("carol@corp.net", 2, 40.0),
                ],
            }],
            stats: stats(),
        }
    }

    #[test]
    fn text_lines_match_expected_format() {
        let text = global_report().to_text(&DisplayOptions::default());
        assert_eq!(
            text,
            "bob@example.com: 3 lines (60.0%)\ncarol@corp.net: 2 lines (40.0%)\n"
        );
    }

    #[test]
    fn domain_stripping_is_cosmetic() {
        let report = global_report();
        let display = DisplayOptions::new(vec!["@example.com".into()]);
        let text = report.to_text(&display);
        assert!(text.starts_with("bob: 3 lines (60.0%)\n"));
        assert!(text.contains("carol@corp.net"));
        assert_eq!(report.scopes[0].reviewers[0].author, "bob@example.com");
    }

    #[test]
    fn display_name_requires_full_domain_match() {
        let display = DisplayOptions::new(vec!["example.com".into()]);
        assert_eq!(display.display_name("eve@notexample.com"), "eve@notexample.com");
        assert_eq!(display.display_name("@example.com"), "@example.com");
    }

    #[test]
    fn per_file_text_has_headers() {
        let report = ReviewerReport {
            scope: Scope::Diff,
            grouping: Grouping::PerFile,
            scopes: vec![
                ScopeReport {
                    path: Some(PathBuf::from("file1.txt")),
                    total_lines: 3,
                    reviewers: vec![reviewer("bob", 3, 100.0)],
                },
                ScopeReport {
                    path: Some(PathBuf::from("file2.txt")),
                    total_lines: 2,
                    reviewers: vec![reviewer("carol", 2, 100.0)],
                },
            ],
            stats: stats(),
        };
        assert_eq!(
            report.to_text(&DisplayOptions::default()),
            "--- file1.txt\nbob: 3 lines (100.0%)\n--- file2.txt\ncarol: 2 lines (100.0%)\n"
        );
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        let mut report = global_report();
        report.scopes[0].reviewers = vec![reviewer("x", 2, 200.0 / 3.0)];
        assert_eq!(
            report.to_text(&DisplayOptions::default()),
            "x: 2 lines (66.7%)\n"
        );
    }

    #[test]
    fn json_carries_raw_and_display_names() {
        let display = DisplayOptions::new(vec!["example.com".into()]);
        let json = global_report().render(OutputFormat::Json, &display).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["grouping"], "global");
        assert_eq!(value["scope"], "diff");
        let first = &value["scopes"][0]["reviewers"][0];
        assert_eq!(first["author"], "bob@example.com");
        assert_eq!(first["displayName"], "bob");
        assert_eq!(first["lines"], 3);
        assert_eq!(value["stats"]["changedLines"], 5);
    }

    #[test]
    fn markdown_has_table() {
        let md = global_report().to_markdown(&DisplayOptions::default());
        assert!(md.contains("| Reviewer | Lines | Share |"));
        assert!(md.contains("| bob@example.com | 3 | 60.0% |"));
    }
}
