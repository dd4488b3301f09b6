//! Joining changed lines with annotations into per-author line counts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use revsight_core::{AnnotationTable, FileLineSet, UNKNOWN_AUTHOR};
use serde::{Deserialize, Serialize};

/// How attributed lines are grouped.
///
/// The per-line attribution rule is the same in both modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grouping {
    /// One tally across every file.
    #[default]
    Global,
    /// One tally per file.
    PerFile,
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Global => write!(f, "global"),
            Grouping::PerFile => write!(f, "per-file"),
        }
    }
}

/// Attributed line count per author identifier.
///
/// # Examples
///
/// ```
/// use revsight_ownership::aggregate::AuthorTally;
///
/// let mut tally = AuthorTally::default();
/// tally.add("alice@example.com");
/// tally.add("alice@example.com");
/// tally.add("bob@example.com");
/// assert_eq!(tally.count("alice@example.com"), 2);
/// assert_eq!(tally.total(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorTally {
    counts: BTreeMap<String, u32>,
}

impl AuthorTally {
    pub fn add(&mut self, author: &str) {
        *self.counts.entry(author.to_string()).or_default() += 1;
    }

    pub fn count(&self, author: &str) -> u32 {
        self.counts.get(author).copied().unwrap_or(0)
    }

    /// Sum of all counts: the number of lines attributed in this scope.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(a, c)| (a.as_str(), *c))
    }

    /// Number of distinct authors.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Aggregated tallies in the requested grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tallies {
    Global(AuthorTally),
    PerFile(BTreeMap<PathBuf, AuthorTally>),
}

/// Count, for every changed line, the author who last touched it.
///
/// Lines with no annotation entry go to [`UNKNOWN_AUTHOR`], so every tally
/// sums to the number of changed lines in its scope.
///
/// # Examples
///
/// ```
/// use revsight_core::{AnnotationTable, FileAnnotation, FileLineSet};
/// use revsight_ownership::aggregate::{aggregate, Grouping, Tallies};
/// use std::path::{Path, PathBuf};
///
/// let path = Path::new("/repo/a.txt");
/// let mut lines = FileLineSet::new();
/// lines.insert_range(path, 3, 3);
/// let mut table = AnnotationTable::new();
/// table.insert(PathBuf::from(path), FileAnnotation::new(vec!["alice".into(); 10]));
///
/// let Tallies::Global(tally) = aggregate(&lines, &table, Grouping::Global) else {
///     unreachable!()
/// };
/// assert_eq!(tally.count("alice"), 3);
/// ```
pub fn aggregate(lines: &FileLineSet, annotations: &AnnotationTable, grouping: Grouping) -> Tallies {
    match grouping {
        Grouping::Global => {
            let mut tally = AuthorTally::default();
            for (path, set) in lines.iter() {
                for &line in set {
                    tally.add(annotations.author_of(path, line).unwrap_or(UNKNOWN_AUTHOR));
                }
            }
            Tallies::Global(tally)
        }
        Grouping::PerFile => {
            let mut per_file = BTreeMap::new();
            for (path, set) in lines.iter() {
                let tally: &mut AuthorTally = per_file.entry(path.to_path_buf()).or_default();
                for &line in set {
                    tally.add(annotations.author_of(path, line).unwrap_or(UNKNOWN_AUTHOR));
                }
            }
            Tallies::PerFile(per_file)
        }
    }
}
