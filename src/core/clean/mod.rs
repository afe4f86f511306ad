//! # Clean Module
//!
//! Finds byte-identical media inside one tree and removes all but one copy.
//!
//! Files are grouped by size first; only same-size files are read in full,
//! hashed with SHA-256 in parallel. Each identical group keeps one file per
//! [`KeepPolicy`]; the rest are reported, moved to a trash directory, or
//! deleted per [`CleanAction`].

mod executor;
mod types;

pub use executor::Cleaner;
pub use types::{CleanAction, CleanConfig, CleanReport, DuplicateSet, KeepPolicy};
