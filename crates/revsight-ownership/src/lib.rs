//! Reviewer attribution: who last touched the lines a change modifies.
//!
//! Joins the changed-line set from a [`VersionControlBackend`] with its
//! line annotations, counts lines per author, and ranks the top candidates.
//! [`pipeline::attribute_reviewers`] runs the whole flow.
//!
//! [`VersionControlBackend`]: revsight_vcs::VersionControlBackend

pub mod aggregate;
pub mod pipeline;
pub mod rank;
pub mod report;
pub mod resolve;
