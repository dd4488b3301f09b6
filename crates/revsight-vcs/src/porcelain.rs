//! Parser for `git blame --porcelain` output.
//!
//! Each blamed line starts with a header
//! `<sha> <orig-line> <final-line> [<group-size>]`, followed by commit
//! metadata the first time a commit appears, and ends with the line content
//! prefixed by a tab:
//!
//! ```text
//! 3f2a... 1 1 2
//! author Alice
//! author-mail <alice@example.com>
//! ...
//! filename src/lib.rs
//! \tfn main() {
//! 3f2a... 2 2
//! \t}
//! ```

use std::collections::{BTreeMap, HashMap};

use revsight_core::{FileAnnotation, RevsightError};

#[derive(Debug, Default, Clone)]
struct CommitAuthor {
    name: String,
    mail: String,
}

/// Author identity for a commit: the email without angle brackets, or the
/// name when no email was recorded.
///
/// # Examples
///
/// ```
/// use revsight_vcs::porcelain::author_identity;
///
/// assert_eq!(author_identity("Alice", "<alice@example.com>"), "alice@example.com");
/// assert_eq!(author_identity("Alice", "<>"), "Alice");
/// ```
pub fn author_identity(name: &str, mail: &str) -> String {
    let mail = mail.trim().trim_start_matches('<').trim_end_matches('>').trim();
    if mail.is_empty() {
        name.trim().to_string()
    } else {
        mail.to_string()
    }
}

/// Parse porcelain blame output into one author per line of the file.
///
/// # Errors
///
/// Returns [`RevsightError::Parse`] if a header is unreadable or the blamed
/// lines do not cover `1..=N` without gaps.
pub fn parse_blame_porcelain(output: &str) -> Result<FileAnnotation, RevsightError> {
    let mut authors: HashMap<String, CommitAuthor> = HashMap::new();
    let mut by_line: BTreeMap<u32, String> = BTreeMap::new();
    let mut current: Option<(String, u32)> = None;

    for line in output.lines() {
        if line.starts_with('\t') {
            if let Some((sha, final_line)) = current.take() {
                by_line.insert(final_line, sha);
            }
            continue;
        }

        let Some((sha, _)) = current.as_ref() else {
            current = Some(parse_header(line)?);
            continue;
        };

        match line.split_once(' ') {
            Some(("author", name)) => {
                authors.entry(sha.clone()).or_default().name = name.to_string();
            }
            Some(("author-mail", mail)) => {
                authors.entry(sha.clone()).or_default().mail = mail.to_string();
            }
            _ => {}
        }
    }

    let mut ordered = Vec::with_capacity(by_line.len());
    for (expected, (line_no, sha)) in (1u32..).zip(&by_line) {
        if *line_no != expected {
            return Err(RevsightError::Parse(format!(
                "blame output skips line {expected}"
            )));
        }
        let author = authors.get(sha).ok_or_else(|| {
            RevsightError::Parse(format!("blame output has no author for commit {sha}"))
        })?;
        ordered.push(author_identity(&author.name, &author.mail));
    }

    Ok(FileAnnotation::new(ordered))
}

fn parse_header(line: &str) -> Result<(String, u32), RevsightError> {
    let invalid = || RevsightError::Parse(format!("invalid blame header: {line}"));
    let mut parts = line.split(' ');
    let sha = parts
        .next()
        .filter(|s| s.len() >= 40 && s.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(invalid)?;
    let _orig = parts.next().ok_or_else(invalid)?;
    let final_line = parts
        .next()
        .and_then(|n| n.parse().ok())
        .ok_or_else(invalid)?;
    Ok((sha.to_string(), final_line))
}
