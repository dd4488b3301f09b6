//! Zero-context unified diff parsing into base-revision line sets.
//!
//! Only two kinds of lines matter: file headers (`--- <path>`) and hunk
//! headers (`@@ -<start>[,<count>] +<start>[,<count>] @@`). Everything else
//! is body content. The old-side range of each hunk is the set of
//! pre-existing lines the change touches.

use std::path::{Path, PathBuf};

use revsight_core::{FileLineSet, RevsightError};

/// Ranges declared by one hunk header.
///
/// # Examples
///
/// ```
/// use revsight_difflens::parser::parse_hunk_header;
///
/// let hunk = parse_hunk_header("@@ -10,3 +12,4 @@ fn main() {").unwrap();
/// assert_eq!((hunk.old_start, hunk.old_lines), (10, 3));
/// assert_eq!(hunk.new_lines, Some(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    /// First line in the base revision.
    pub old_start: u32,
    /// Number of base-revision lines covered (1 when omitted).
    pub old_lines: u32,
    /// First line in the new version, when the header carries one.
    pub new_start: Option<u32>,
    /// Number of new-version lines, when the header carries one.
    pub new_lines: Option<u32>,
}

/// Turns zero-context unified diff output into a [`FileLineSet`].
///
/// Relative paths in file headers are resolved against `root`, so keys of
/// the result are absolute whenever `root` is.
///
/// # Examples
///
/// ```
/// use revsight_difflens::parser::ChangedLinesParser;
/// use std::path::Path;
///
/// let diff = "--- src/lib.rs\n\
///             +++ src/lib.rs\n\
///             @@ -10,3 +10,2 @@\n\
///             -a\n\
///             -b\n\
///             -c\n\
///             +x\n\
///             +y\n";
/// let lines = ChangedLinesParser::new("/repo").parse(diff).unwrap();
/// let set = lines.lines(Path::new("/repo/src/lib.rs")).unwrap();
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![10, 11, 12]);
/// ```
#[derive(Debug, Clone)]
pub struct ChangedLinesParser {
    root: PathBuf,
    strip_prefix: bool,
}

/// What the most recent file header pointed at.
enum Target {
    /// No file header seen yet.
    Unset,
    /// `--- /dev/null`: the file has no base side.
    NoBase,
    File(PathBuf),
}

/// Body lines still owed by the current hunk.
struct Pending {
    old: u32,
    new: u32,
}

impl ChangedLinesParser {
    /// Parser for diffs produced without `a/`/`b/` path prefixes.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strip_prefix: false,
        }
    }

    /// Strip a leading `a/` from file headers, for diffs produced with prefixes.
    pub fn with_prefixes(mut self) -> Self {
        self.strip_prefix = true;
        self
    }

    /// Parse `input` into changed base-revision lines per file.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::MalformedDiff`] when a hunk header appears
    /// before any file header, or when a hunk header cannot be read.
    pub fn parse(&self, input: &str) -> Result<FileLineSet, RevsightError> {
        let mut lines = FileLineSet::new();
        let mut target = Target::Unset;
        let mut pending: Option<Pending> = None;

        for (idx, line) in input.lines().enumerate() {
            if let Some(body) = pending.as_mut() {
                if body.old > 0 || body.new > 0 {
                    match line.as_bytes().first() {
                        Some(b'-') => {
                            body.old = body.old.saturating_sub(1);
                            continue;
                        }
                        Some(b'+') => {
                            body.new = body.new.saturating_sub(1);
                            continue;
                        }
                        Some(b' ') => {
                            body.old = body.old.saturating_sub(1);
                            body.new = body.new.saturating_sub(1);
                            continue;
                        }
                        Some(b'\\') => continue,
                        // Body ended early; treat the line as a header candidate.
                        _ => pending = None,
                    }
                }
            }

            if let Some(raw) = line.strip_prefix("--- ") {
                pending = None;
                target = match self.header_path(raw) {
                    Some(path) => {
                        lines.reset_file(&path);
                        Target::File(path)
                    }
                    None => Target::NoBase,
                };
                continue;
            }

            if line.starts_with("@@ ") {
                let hunk = parse_hunk_header(line)?;
                match &target {
                    Target::Unset => {
                        return Err(RevsightError::MalformedDiff(format!(
                            "line {}: hunk header before any file header: {line}",
                            idx + 1
                        )));
                    }
                    Target::NoBase => {}
                    Target::File(path) => lines.insert_range(path, hunk.old_start, hunk.old_lines),
                }
                pending = hunk.new_lines.map(|new| Pending {
                    old: hunk.old_lines,
                    new,
                });
            }
        }

        Ok(lines)
    }

    fn header_path(&self, raw: &str) -> Option<PathBuf> {
        // Timestamps (hg) and names with spaces (git) are tab-separated.
        let raw = raw.split('\t').next().unwrap_or(raw).trim_end();
        let name = unquote(raw);
        if name == "/dev/null" {
            return None;
        }

        let name = if self.strip_prefix {
            name.strip_prefix("a/").unwrap_or(&name).to_string()
        } else {
            name
        };

        let path = Path::new(&name);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.root.join(path))
        }
    }
}

/// Parse `input` with a parser rooted at `root`; see [`ChangedLinesParser`].
///
/// # Errors
///
/// Returns [`RevsightError::MalformedDiff`] on protocol violations.
///
/// # Examples
///
/// ```
/// use revsight_difflens::parser::parse_changed_lines;
/// use std::path::Path;
///
/// let lines = parse_changed_lines("", Path::new("/repo")).unwrap();
/// assert!(lines.is_empty());
///
/// assert!(parse_changed_lines("@@ -1 +1 @@\n", Path::new("/repo")).is_err());
/// ```
pub fn parse_changed_lines(input: &str, root: &Path) -> Result<FileLineSet, RevsightError> {
    ChangedLinesParser::new(root).parse(input)
}

/// Parse a hunk header of the form `@@ -<start>[,<count>] [+<start>[,<count>]] @@`.
///
/// An omitted count means one line.
///
/// # Errors
///
/// Returns [`RevsightError::MalformedDiff`] if the old-side range is missing
/// or not numeric.
pub fn parse_hunk_header(line: &str) -> Result<HunkHeader, RevsightError> {
    let malformed = || RevsightError::MalformedDiff(format!("invalid hunk header: {line}"));

    let inner = line.strip_prefix("@@ ").ok_or_else(malformed)?;
    let inner = match inner.find("@@") {
        Some(end) => &inner[..end],
        None => inner,
    };

    let mut parts = inner.split_whitespace();
    let old = parts
        .next()
        .and_then(|p| p.strip_prefix('-'))
        .ok_or_else(malformed)?;
    let (old_start, old_lines) = parse_range(old).ok_or_else(malformed)?;

    let new = parts
        .next()
        .and_then(|p| p.strip_prefix('+'))
        .and_then(parse_range);

    Ok(HunkHeader {
        old_start,
        old_lines,
        new_start: new.map(|(start, _)| start),
        new_lines: new.map(|(_, count)| count),
    })
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Undo C-style quoting applied by git to unusual file names.
fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.bytes().peekable();
    while let Some(b) = chars.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&o @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(o - b'0');
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
