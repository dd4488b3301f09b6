//! Mercurial backend, driven entirely through the `hg` executable.
//!
//! Commands run with `HGPLAIN=1` so user configuration cannot change the
//! output format. Annotation uses the JSON template rather than scraping
//! the column layout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use revsight_core::{AnnotationTable, FileAnnotation, FileLineSet, RevsightError, UNKNOWN_AUTHOR};
use revsight_difflens::parser::ChangedLinesParser;
use serde::Deserialize;

use crate::paths::relative_to;
use crate::process::{count_lines, VcsCommand};
use crate::{BackendOptions, VersionControlBackend};

/// Reviewer attribution against a Mercurial working directory.
#[derive(Debug, Clone)]
pub struct HgBackend {
    root: PathBuf,
    options: BackendOptions,
}

#[derive(Debug, Deserialize)]
struct AnnotatedFile {
    path: String,
    #[serde(default)]
    lines: Vec<AnnotatedLine>,
}

#[derive(Debug, Deserialize)]
struct AnnotatedLine {
    user: Option<String>,
}

impl HgBackend {
    /// Find the repository enclosing `path` by looking for `.hg`.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::NoRepository`] when there is none.
    pub fn open(path: &Path, options: BackendOptions) -> Result<Self, RevsightError> {
        let root = path
            .ancestors()
            .find(|dir| dir.join(".hg").is_dir())
            .ok_or_else(|| RevsightError::NoRepository(path.to_path_buf()))?;
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        Ok(Self { root, options })
    }

    fn command(&self) -> VcsCommand {
        VcsCommand::new("hg", &self.root).env("HGPLAIN", "1")
    }

    fn status_command(&self, rels: &[PathBuf], revision: &str) -> VcsCommand {
        let cmd = self.command().args([
            "status",
            "--rev",
            revision,
            "--modified",
            "--removed",
            "--deleted",
            "--no-status",
            "--print0",
        ]);
        if rels.is_empty() {
            cmd
        } else {
            cmd.arg("--")
                .args(rels.iter().map(|p| p.as_os_str().to_os_string()))
        }
    }

    fn annotate_command(&self, rels: &[PathBuf], revision: &str) -> VcsCommand {
        let mut cmd = self
            .command()
            .args(["annotate", "--rev", revision, "--text", "--user", "--template", "json"]);
        for rev in &self.options.ignore_revisions {
            cmd = cmd.arg("--skip").arg(rev.as_str());
        }
        cmd.arg("--")
            .args(rels.iter().map(|p| p.as_os_str().to_os_string()))
    }

    /// Repository-relative paths reported by `hg status`.
    async fn status(&self, rels: &[PathBuf], revision: &str) -> Result<Vec<PathBuf>, RevsightError> {
        let output = self
            .status_command(rels, revision)
            .run(self.options.timeout)
            .await?;
        Ok(output
            .split('\0')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

/// Email inside `<...>` of a Mercurial user string, or the whole string.
///
/// # Examples
///
/// ```
/// use revsight_vcs::hg::user_identity;
///
/// assert_eq!(user_identity("Carol <carol@example.com>"), "carol@example.com");
/// assert_eq!(user_identity("carol"), "carol");
/// ```
pub fn user_identity(user: &str) -> String {
    let user = user.trim();
    match (user.rfind('<'), user.rfind('>')) {
        (Some(open), Some(close)) if open < close && close > open + 1 => {
            user[open + 1..close].trim().to_string()
        }
        _ => user.to_string(),
    }
}

/// Parse `hg annotate --text --user --template json` output, keyed by repository-relative path.
///
/// # Errors
///
/// Returns [`RevsightError::Serialization`] if the output is not the expected JSON.
pub fn parse_annotate_json(output: &str) -> Result<HashMap<PathBuf, FileAnnotation>, RevsightError> {
    let files: Vec<AnnotatedFile> = serde_json::from_str(output)?;
    Ok(files
        .into_iter()
        .map(|file| {
            let authors = file
                .lines
                .iter()
                .map(|line| {
                    line.user
                        .as_deref()
                        .map(user_identity)
                        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
                })
                .collect();
            (PathBuf::from(file.path), FileAnnotation::new(authors))
        })
        .collect())
}

impl VersionControlBackend for HgBackend {
    fn name(&self) -> &'static str {
        "hg"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn default_revision(&self) -> &'static str {
        "."
    }

    async fn pending_files(&self, revision: &str) -> Result<Vec<PathBuf>, RevsightError> {
        let mut files: Vec<PathBuf> = self
            .status(&[], revision)
            .await?
            .into_iter()
            .map(|rel| self.root.join(rel))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn whole_file_lines(
        &self,
        files: &[PathBuf],
        revision: &str,
    ) -> Result<FileLineSet, RevsightError> {
        let mut lines = FileLineSet::new();
        for file in files {
            let rel = relative_to(&self.root, file)?;
            let content = self
                .command()
                .args(["cat", "--rev", revision, "--"])
                .arg(rel.as_os_str())
                .run(self.options.timeout)
                .await?;
            lines.insert_whole_file(&self.root.join(&rel), count_lines(content.as_bytes()));
        }
        Ok(lines)
    }

    async fn modified_lines(
        &self,
        files: &[PathBuf],
        revision: &str,
    ) -> Result<FileLineSet, RevsightError> {
        if files.is_empty() {
            return Ok(FileLineSet::new());
        }
        let rels = files
            .iter()
            .map(|f| relative_to(&self.root, f))
            .collect::<Result<Vec<_>, _>>()?;

        // hg diff has no status filter, so restrict to modified/removed first.
        let changed = self.status(&rels, revision).await?;
        if changed.is_empty() {
            return Ok(FileLineSet::new());
        }

        let diff = self
            .command()
            .args(["diff", "--rev", revision, "--unified", "0", "--nodates", "--"])
            .args(changed.iter().map(|p| p.as_os_str().to_os_string()))
            .run(self.options.timeout)
            .await?;
        ChangedLinesParser::new(&self.root)
            .with_prefixes()
            .parse(&diff)
    }

    async fn annotate(
        &self,
        paths: &[PathBuf],
        revision: &str,
    ) -> Result<AnnotationTable, RevsightError> {
        if paths.is_empty() {
            return Ok(AnnotationTable::new());
        }
        let rels = paths
            .iter()
            .map(|p| relative_to(&self.root, p))
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .annotate_command(&rels, revision)
            .run(self.options.timeout)
            .await?;
        Ok(collect_annotations(paths, &rels, parse_annotate_json(&output)?))
    }
}

/// Key annotations by absolute path. A path hg printed nothing for gets an
/// empty annotation, so all of its lines count as unknown.
fn collect_annotations(
    paths: &[PathBuf],
    rels: &[PathBuf],
    mut annotated: HashMap<PathBuf, FileAnnotation>,
) -> AnnotationTable {
    let mut table = AnnotationTable::new();
    for (path, rel) in paths.iter().zip(rels) {
        table.insert(path.clone(), annotated.remove(rel).unwrap_or_default());
    }
    table
}
