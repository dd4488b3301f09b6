//! Git backend: libgit2 for repository reads, the `git` executable for
//! diff and blame text.

use std::path::{Path, PathBuf};

use git2::{Delta, DiffOptions, Repository};
use revsight_core::{AnnotationTable, FileLineSet, RevsightError};
use revsight_difflens::parser::ChangedLinesParser;

use crate::paths::relative_to;
use crate::porcelain::parse_blame_porcelain;
use crate::process::{count_lines, VcsCommand};
use crate::{BackendOptions, VersionControlBackend};

/// Reviewer attribution against a git working tree.
///
/// # Examples
///
/// ```no_run
/// use revsight_vcs::git::GitBackend;
/// use revsight_vcs::{BackendOptions, VersionControlBackend};
/// use std::path::Path;
///
/// let backend = GitBackend::open(Path::new("."), BackendOptions::default()).unwrap();
/// assert_eq!(backend.default_revision(), "HEAD");
/// ```
#[derive(Debug, Clone)]
pub struct GitBackend {
    root: PathBuf,
    options: BackendOptions,
}

impl GitBackend {
    /// Discover the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Backend`] if no repository is found or it
    /// has no working tree.
    pub fn open(path: &Path, options: BackendOptions) -> Result<Self, RevsightError> {
        let repo = Repository::discover(path)
            .map_err(|e| RevsightError::Backend(format!("failed to open repository: {e}")))?;
        let workdir = repo.workdir().ok_or_else(|| {
            RevsightError::Backend("bare repository has no working tree".into())
        })?;
        let root = workdir
            .canonicalize()
            .unwrap_or_else(|_| workdir.to_path_buf());
        Ok(Self { root, options })
    }

    fn repo(&self) -> Result<Repository, RevsightError> {
        Repository::open(&self.root)
            .map_err(|e| RevsightError::Backend(format!("failed to open repository: {e}")))
    }

    /// Paths are always literal; `a[1].txt` must not also match `a1.txt`.
    fn command(&self) -> VcsCommand {
        VcsCommand::new("git", &self.root).arg("--literal-pathspecs")
    }

    fn diff_command(&self, rels: &[PathBuf], revision: &str) -> VcsCommand {
        self.command()
            .args([
                "diff",
                "-U0",
                "--no-color",
                "--no-ext-diff",
                "--no-textconv",
                "--no-prefix",
                "--no-renames",
                "--diff-filter=MD",
                revision,
                "--",
            ])
            .args(rels.iter().map(|p| p.as_os_str().to_os_string()))
    }

    fn blame_command(&self, rel: &Path, revision: &str) -> VcsCommand {
        let mut cmd = self.command().args(["blame", "--porcelain"]);
        for rev in &self.options.ignore_revisions {
            cmd = cmd.arg("--ignore-rev").arg(rev.as_str());
        }
        cmd.arg(revision).arg("--").arg(rel.as_os_str())
    }
}

fn tree_at<'r>(repo: &'r Repository, revision: &str) -> Result<git2::Tree<'r>, RevsightError> {
    repo.revparse_single(revision)
        .and_then(|obj| obj.peel_to_commit())
        .and_then(|commit| commit.tree())
        .map_err(|e| RevsightError::Backend(format!("cannot resolve revision '{revision}': {e}")))
}

impl VersionControlBackend for GitBackend {
    fn name(&self) -> &'static str {
        "git"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn default_revision(&self) -> &'static str {
        "HEAD"
    }

    async fn pending_files(&self, revision: &str) -> Result<Vec<PathBuf>, RevsightError> {
        let repo = self.repo()?;
        let tree = tree_at(&repo, revision)?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(false);
        let diff = repo
            .diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))
            .map_err(|e| RevsightError::Backend(format!("failed to compute diff: {e}")))?;

        let mut files: Vec<PathBuf> = diff
            .deltas()
            .filter(|d| matches!(d.status(), Delta::Modified | Delta::Deleted))
            .filter_map(|d| d.old_file().path().map(|p| self.root.join(p)))
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    async fn whole_file_lines(
        &self,
        files: &[PathBuf],
        revision: &str,
    ) -> Result<FileLineSet, RevsightError> {
        let repo = self.repo()?;
        let tree = tree_at(&repo, revision)?;

        let mut lines = FileLineSet::new();
        for file in files {
            let rel = relative_to(&self.root, file)?;
            let blob = tree
                .get_path(&rel)
                .and_then(|entry| entry.to_object(&repo))
                .and_then(|obj| obj.peel_to_blob())
                .map_err(|e| {
                    RevsightError::Backend(format!(
                        "{} is not a file at {revision}: {e}",
                        rel.display()
                    ))
                })?;
            lines.insert_whole_file(&self.root.join(&rel), count_lines(blob.content()));
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
        {
            let repo = self.repo()?;
            tree_at(&repo, revision)?;
        }

        let rels = files
            .iter()
            .map(|f| relative_to(&self.root, f))
            .collect::<Result<Vec<_>, _>>()?;
        let diff = self
            .diff_command(&rels, revision)
            .run(self.options.timeout)
            .await?;
        ChangedLinesParser::new(&self.root).parse(&diff)
    }

    async fn annotate(
        &self,
        paths: &[PathBuf],
        revision: &str,
    ) -> Result<AnnotationTable, RevsightError> {
        let mut table = AnnotationTable::new();
        for path in paths {
            let rel = relative_to(&self.root, path)?;
            let output = self
                .blame_command(&rel, revision)
                .run(self.options.timeout)
                .await?;
            let annotation = parse_blame_porcelain(&output).map_err(|e| {
                RevsightError::Parse(format!("blame of {}: {e}", rel.display()))
            })?;
            table.insert(path.clone(), annotation);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(ignore: &[&str]) -> GitBackend {
        GitBackend {
            root: PathBuf::from("/repo"),
            options: BackendOptions {
                ignore_revisions: ignore.iter().map(|s| s.to_string()).collect(),
                ..BackendOptions::default()
            },
        }
    }

    #[test]
    fn blame_passes_ignored_revisions() {
        let args = backend(&["abc123", "def456"])
            .blame_command(Path::new("src/lib.rs"), "HEAD~1")
            .arg_strings();
        assert_eq!(
            args,
            vec![
                "--literal-pathspecs",
                "blame",
                "--porcelain",
                "--ignore-rev",
                "abc123",
                "--ignore-rev",
                "def456",
                "HEAD~1",
                "--",
                "src/lib.rs"
            ]
        );
    }

    #[test]
    fn diff_is_zero_context_and_restricted_to_modified_or_deleted() {
        let args = backend(&[])
            .diff_command(&[PathBuf::from("a.txt")], "HEAD")
            .arg_strings();
        assert!(args.contains(&"-U0".to_string()));
        assert!(args.contains(&"--diff-filter=MD".to_string()));
        assert!(args.contains(&"--no-prefix".to_string()));
        assert_eq!(args[0], "--literal-pathspecs");
        assert_eq!(args.last().map(String::as_str), Some("a.txt"));
    }
}
