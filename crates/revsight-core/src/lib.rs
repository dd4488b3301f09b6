//! Core types, configuration, and error handling for revsight.
//!
//! This crate provides the shared foundation used by all other revsight crates:
//! - [`RevsightError`]: unified error type using `thiserror` and `miette`
//! - [`RevsightConfig`]: configuration loaded from `.revsight.toml`
//! - Shared data model: [`FileLineSet`], [`FileAnnotation`],
//!   [`AnnotationTable`], [`OutputFormat`], [`VcsKind`]

mod config;
mod error;
mod types;

pub use config::{BackendConfig, ReviewersConfig, RevsightConfig};
pub use error::RevsightError;
pub use types::{
    AnnotationTable, FileAnnotation, FileLineSet, OutputFormat, VcsKind, UNKNOWN_AUTHOR,
};

/// A convenience `Result` type for revsight operations.
pub type Result<T> = std::result::Result<T, RevsightError>;
