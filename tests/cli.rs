use std::path::Path;
use std::process::{Command, Output};

use git2::{IndexAddOption, Repository, Signature};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn revsight(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_revsight"))
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "revsight failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn commit_all(repo: &Repository, name: &str, email: &str) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now(name, email).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parents)
        .unwrap();
}

fn numbered(count: usize) -> String {
    (1..=count).map(|n| format!("line {n}\n")).collect()
}

/// `file1.txt` by bob, `file2.txt` by carol, 3 lines each.
fn two_author_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    std::fs::write(dir.path().join("file1.txt"), numbered(3)).unwrap();
    commit_all(&repo, "Bob", "bob@example.com");
    std::fs::write(dir.path().join("file2.txt"), numbered(3)).unwrap();
    commit_all(&repo, "Carol", "carol@example.com");
    dir
}

#[test]
fn zero_reviewers_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = revsight(dir.path(), &["-n", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("num_reviewers"), "stderr: {stderr}");
}

#[test]
fn fails_outside_a_repository() {
    let dir = tempfile::tempdir().unwrap();
    let output = revsight(dir.path(), &[]);
    assert!(!output.status.success());
}

#[test]
fn single_author_with_stripped_domain() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    std::fs::write(dir.path().join("a.txt"), numbered(10)).unwrap();
    commit_all(&repo, "Alice", "alice@example.com");

    let text = numbered(10)
        .replace("line 3\n", "three\n")
        .replace("line 4\n", "four\n")
        .replace("line 5\n", "five\n");
    std::fs::write(dir.path().join("a.txt"), text).unwrap();
    std::fs::write(
        dir.path().join(".revsight.toml"),
        "[reviewers]\nstrip_domains = [\"example.com\"]\n",
    )
    .unwrap();

    let out = stdout(&revsight(dir.path(), &["a.txt"]));
    assert_eq!(out, "alice: 3 lines (100.0%)\n");
}

#[test]
fn global_and_per_file_rankings() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let dir = two_author_repo();
    std::fs::write(dir.path().join("file1.txt"), "a\nb\nc\n").unwrap();
    std::fs::write(dir.path().join("file2.txt"), "x\ny\nline 3\n").unwrap();

    let out = stdout(&revsight(dir.path(), &[]));
    assert_eq!(
        out,
        "bob@example.com: 3 lines (60.0%)\ncarol@example.com: 2 lines (40.0%)\n"
    );

    let out = stdout(&revsight(dir.path(), &["-f"]));
    assert_eq!(
        out,
        "--- file1.txt\nbob@example.com: 3 lines (100.0%)\n\
         --- file2.txt\ncarol@example.com: 2 lines (100.0%)\n"
    );
}

#[test]
fn whole_file_and_json_output() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let dir = two_author_repo();

    let out = stdout(&revsight(
        dir.path(),
        &["-w", "file1.txt", "file2.txt", "-n", "1", "--format", "json"],
    ));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["scope"], "wholeFile");
    let scope = &value["scopes"][0];
    assert_eq!(scope["totalLines"], 6);
    assert_eq!(scope["reviewers"].as_array().unwrap().len(), 1);
    // Tie at 3 lines each resolves alphabetically.
    assert_eq!(scope["reviewers"][0]["author"], "bob@example.com");
    assert_eq!(scope["reviewers"][0]["percent"], 50.0);
}

#[test]
fn clean_tree_reports_nothing() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let dir = two_author_repo();
    let out = stdout(&revsight(dir.path(), &[]));
    assert!(out.is_empty());
}
