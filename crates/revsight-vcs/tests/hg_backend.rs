use std::path::{Path, PathBuf};
use std::process::Command;

use revsight_core::RevsightError;
use revsight_vcs::hg::HgBackend;
use revsight_vcs::{BackendOptions, VersionControlBackend};

fn hg_available() -> bool {
    Command::new("hg")
        .arg("--version")
        .env("HGPLAIN", "1")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn hg(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("hg")
        .args(args)
        .current_dir(dir)
        .env("HGPLAIN", "1")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "hg {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn commit_all(dir: &Path, user: &str, message: &str) {
    hg(dir, &["commit", "--addremove", "--user", user, "--message", message]);
}

fn numbered(count: usize) -> String {
    (1..=count).map(|n| format!("line {n}\n")).collect()
}

/// `a.txt`: 10 lines by alice, line 2 later rewritten by bob.
/// `gone.txt`: 3 lines by alice.
/// Returns the directory and bob's changeset id.
fn fixture() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    hg(dir.path(), &["init"]);

    std::fs::write(dir.path().join("a.txt"), numbered(10)).unwrap();
    std::fs::write(dir.path().join("gone.txt"), numbered(3)).unwrap();
    commit_all(dir.path(), "Alice <alice@example.com>", "init");

    let text = numbered(10).replace("line 2\n", "line two\n");
    std::fs::write(dir.path().join("a.txt"), text).unwrap();
    commit_all(dir.path(), "Bob <bob@example.com>", "rename line 2");

    let bob = hg(dir.path(), &["log", "--rev", ".", "--template", "{node}"]);
    (dir, bob.trim().to_string())
}

fn set(lines: Option<&std::collections::BTreeSet<u32>>) -> Vec<u32> {
    lines.map(|l| l.iter().copied().collect()).unwrap_or_default()
}

#[tokio::test]
async fn modified_and_removed_files_end_to_end() {
    if !hg_available() {
        eprintln!("hg not found, skipping");
        return;
    }
    let (dir, _bob) = fixture();
    let backend = HgBackend::open(dir.path(), BackendOptions::default()).unwrap();
    assert_eq!(backend.default_revision(), ".");
    let root = backend.root().to_path_buf();
    let a = root.join("a.txt");
    let gone = root.join("gone.txt");

    // Rewrite lines 2..=4, append a line, remove gone.txt, add new.txt.
    let text = numbered(10)
        .replace("line 2\n", "LINE 2\n")
        .replace("line 3\n", "LINE 3\n")
        .replace("line 4\n", "LINE 4\n")
        + "line 11\n";
    std::fs::write(&a, text).unwrap();
    hg(&root, &["remove", "gone.txt"]);
    std::fs::write(root.join("new.txt"), "fresh\n").unwrap();
    hg(&root, &["add", "new.txt"]);

    let pending = backend.pending_files(".").await.unwrap();
    assert_eq!(pending, vec![a.clone(), gone.clone()]);

    let lines = backend.modified_lines(&pending, ".").await.unwrap();
    assert_eq!(set(lines.lines(&a)), vec![2, 3, 4]);
    assert_eq!(set(lines.lines(&gone)), vec![1, 2, 3]);
    assert!(lines.lines(&root.join("new.txt")).is_none());

    let paths: Vec<PathBuf> = lines.paths().map(Path::to_path_buf).collect();
    let table = backend.annotate(&paths, ".").await.unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.author_of(&a, 1), Some("alice@example.com"));
    assert_eq!(table.author_of(&a, 2), Some("bob@example.com"));
    assert_eq!(table.get(&a).unwrap().line_count(), 10);
    assert_eq!(table.author_of(&gone, 3), Some("alice@example.com"));
}

#[tokio::test]
async fn new_file_is_not_pending() {
    if !hg_available() {
        eprintln!("hg not found, skipping");
        return;
    }
    let (dir, _bob) = fixture();
    let backend = HgBackend::open(dir.path(), BackendOptions::default()).unwrap();
    let root = backend.root().to_path_buf();
    std::fs::write(root.join("new.txt"), "fresh\n").unwrap();
    hg(&root, &["add", "new.txt"]);

    assert!(backend.pending_files(".").await.unwrap().is_empty());
    let lines = backend
        .modified_lines(&[root.join("new.txt")], ".")
        .await
        .unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn whole_file_lines_honor_revision() {
    if !hg_available() {
        eprintln!("hg not found, skipping");
        return;
    }
    let (dir, _bob) = fixture();
    let backend = HgBackend::open(dir.path(), BackendOptions::default()).unwrap();
    let a = backend.root().join("a.txt");
    std::fs::write(&a, "short\n").unwrap();

    let lines = backend
        .whole_file_lines(std::slice::from_ref(&a), ".")
        .await
        .unwrap();
    assert_eq!(set(lines.lines(&a)), (1..=10).collect::<Vec<_>>());

    // At the first changeset bob has not touched line 2 yet.
    let table = backend
        .annotate(std::slice::from_ref(&a), "0")
        .await
        .unwrap();
    assert_eq!(table.author_of(&a, 2), Some("alice@example.com"));

    let err = backend
        .whole_file_lines(&[a], "no-such-rev")
        .await
        .unwrap_err();
    assert!(matches!(err, RevsightError::Backend(_)));
}

#[tokio::test]
async fn skipped_revision_moves_attribution_to_earlier_author() {
    if !hg_available() {
        eprintln!("hg not found, skipping");
        return;
    }
    let (dir, bob) = fixture();
    let options = BackendOptions {
        ignore_revisions: vec![bob],
        ..BackendOptions::default()
    };
    let backend = HgBackend::open(dir.path(), options).unwrap();
    let a = backend.root().join("a.txt");

    let table = backend
        .annotate(std::slice::from_ref(&a), ".")
        .await
        .unwrap();
    assert_eq!(table.author_of(&a, 2), Some("alice@example.com"));
}

#[tokio::test]
async fn binary_file_lines_fall_to_unknown() {
    if !hg_available() {
        eprintln!("hg not found, skipping");
        return;
    }
    let (dir, _bob) = fixture();
    let root = dir.path();
    std::fs::write(root.join("logo.png"), b"a\0b\nc\n").unwrap();
    commit_all(root, "Carol <carol@example.com>", "add logo");

    let backend = HgBackend::open(root, BackendOptions::default()).unwrap();
    let logo = backend.root().join("logo.png");
    let lines = backend
        .whole_file_lines(std::slice::from_ref(&logo), ".")
        .await
        .unwrap();
    assert_eq!(set(lines.lines(&logo)), vec![1, 2]);

    let table = backend
        .annotate(std::slice::from_ref(&logo), ".")
        .await
        .unwrap();
    assert!(table.get(&logo).is_some());
}
