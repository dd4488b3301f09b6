//! Ranking authors within a tally.

use std::cmp::Ordering;

use serde::Serialize;

use crate::aggregate::AuthorTally;

/// One reviewer candidate with their share of the scope's lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAuthor {
    /// Raw author identifier, as aggregated.
    pub author: String,
    /// Lines attributed to this author.
    pub lines: u32,
    /// `100 * lines / total` for the scope.
    pub percent: f64,
}

/// Top `limit` authors of `tally`.
///
/// Sorted by line count descending; equal counts are ordered by author
/// identifier ascending so output never depends on hash or insertion order.
/// Percentages use the whole tally as denominator, including authors cut
/// by `limit`.
///
/// # Examples
///
/// ```
/// use revsight_ownership::aggregate::AuthorTally;
/// use revsight_ownership::rank::rank_authors;
///
/// let mut tally = AuthorTally::default();
/// for author in ["bob", "bob", "bob", "carol", "carol"] {
///     tally.add(author);
/// }
/// let ranked = rank_authors(&tally, 3);
/// assert_eq!(ranked[0].author, "bob");
/// assert_eq!(ranked[0].percent, 60.0);
/// assert_eq!(ranked[1].percent, 40.0);
/// ```
pub fn rank_authors(tally: &AuthorTally, limit: usize) -> Vec<RankedAuthor> {
    let total = tally.total();
    let mut ranked: Vec<(&str, u32)> = tally.iter().collect();
    ranked.sort_by(|a, b| compare(*a, *b));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(author, lines)| RankedAuthor {
            author: author.to_string(),
            lines,
            percent: percent(lines, total),
        })
        .collect()
}

fn compare(a: (&str, u32), b: (&str, u32)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

fn percent(lines: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * f64::from(lines) / f64::from(total)
    }
}
