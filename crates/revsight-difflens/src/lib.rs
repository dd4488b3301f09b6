//! Diff parsing and path filtering.
//!
//! Reads zero-context unified diffs (as produced by `git diff -U0` or
//! `hg diff --unified 0`) into the set of base-revision lines each change
//! touches, and filters out files that should never be attributed.
pub mod filter;
pub mod parser;
