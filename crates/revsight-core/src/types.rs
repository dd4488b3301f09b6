use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Author bucket for changed lines that have no annotation entry.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Changed (or whole-file) line numbers per file, relative to the base revision.
///
/// Keys are absolute paths. Line numbers are 1-based and unique per file.
/// A file may be present with no lines, e.g. when its diff only adds lines.
///
/// # Examples
///
/// ```
/// use revsight_core::FileLineSet;
/// use std::path::Path;
///
/// let mut lines = FileLineSet::new();
/// lines.insert_range(Path::new("/repo/a.txt"), 3, 3);
/// assert_eq!(lines.total_lines(), 3);
/// assert!(lines.lines(Path::new("/repo/a.txt")).unwrap().contains(&5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLineSet {
    files: BTreeMap<PathBuf, BTreeSet<u32>>,
}

impl FileLineSet {
    /// Create an empty line set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` with an empty line set, discarding anything recorded before.
    pub fn reset_file(&mut self, path: &Path) {
        self.files.insert(path.to_path_buf(), BTreeSet::new());
    }

    /// Add `count` lines starting at `start`. A zero count only registers the file.
    pub fn insert_range(&mut self, path: &Path, start: u32, count: u32) {
        let set = self.files.entry(path.to_path_buf()).or_default();
        if count == 0 {
            return;
        }
        let end = start.saturating_add(count - 1);
        set.extend(start.max(1)..=end);
    }

    /// The full set `{1..=line_count}` for `path`.
    pub fn insert_whole_file(&mut self, path: &Path, line_count: u32) {
        self.insert_range(path, 1, line_count);
    }

    /// Recorded lines of `path`; `None` when the file was never registered.
    pub fn lines(&self, path: &Path) -> Option<&BTreeSet<u32>> {
        self.files.get(path)
    }

    /// Registered files in path order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Files with their lines, in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &BTreeSet<u32>)> {
        self.files.iter().map(|(p, l)| (p.as_path(), l))
    }

    /// Number of files, including files with no lines.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `true` when no file is registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of line counts across all files.
    pub fn total_lines(&self) -> usize {
        self.files.values().map(BTreeSet::len).sum()
    }
}

/// Last-modifying author for every line of one file at a reference revision.
///
/// Lookup is 1-based. Line `0` is the "no line" sentinel and never resolves,
/// and neither does anything past the end of the file.
///
/// # Examples
///
/// ```
/// use revsight_core::FileAnnotation;
///
/// let ann = FileAnnotation::new(vec!["alice".into(), "bob".into()]);
/// assert_eq!(ann.line_count(), 2);
/// assert_eq!(ann.author_at(0), None);
/// assert_eq!(ann.author_at(2), Some("bob"));
/// assert_eq!(ann.author_at(3), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAnnotation {
    authors: Vec<String>,
}

impl FileAnnotation {
    /// Build from authors ordered by line, first line first.
    pub fn new(authors: Vec<String>) -> Self {
        Self { authors }
    }

    /// Author of 1-based `line`.
    pub fn author_at(&self, line: u32) -> Option<&str> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.authors.get(index).map(String::as_str)
    }

    /// Number of annotated lines.
    pub fn line_count(&self) -> usize {
        self.authors.len()
    }
}

/// Per-file annotations, keyed by absolute path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationTable {
    files: BTreeMap<PathBuf, FileAnnotation>,
}

impl AnnotationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the annotation of `path`, replacing any previous one.
    pub fn insert(&mut self, path: PathBuf, annotation: FileAnnotation) {
        self.files.insert(path, annotation);
    }

    /// Annotation of `path`, if it was annotated.
    pub fn get(&self, path: &Path) -> Option<&FileAnnotation> {
        self.files.get(path)
    }

    /// Author of `line` in `path`, if the annotation covers it.
    pub fn author_of(&self, path: &Path, line: u32) -> Option<&str> {
        self.get(path)?.author_at(line)
    }

    /// Number of annotated files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `true` when no file is annotated.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Output format for the reviewer report.
///
/// # Examples
///
/// ```
/// use revsight_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `<author>: <n> lines (<pct>%)` line per reviewer.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown tables.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Which version-control ecosystem to talk to.
///
/// # Examples
///
/// ```
/// use revsight_core::VcsKind;
///
/// assert_eq!("mercurial".parse::<VcsKind>().unwrap(), VcsKind::Hg);
/// assert_eq!(VcsKind::default(), VcsKind::Auto);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    /// Detect from the repository layout.
    #[default]
    Auto,
    /// Git, via libgit2 and the `git` executable.
    Git,
    /// Mercurial, via the `hg` executable.
    #[serde(alias = "mercurial")]
    Hg,
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsKind::Auto => write!(f, "auto"),
            VcsKind::Git => write!(f, "git"),
            VcsKind::Hg => write!(f, "hg"),
        }
    }
}

impl FromStr for VcsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(VcsKind::Auto),
            "git" => Ok(VcsKind::Git),
            "hg" | "mercurial" => Ok(VcsKind::Hg),
            other => Err(format!("unknown vcs: {other}")),
        }
    }
}
