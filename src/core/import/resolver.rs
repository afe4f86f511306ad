//! Conflict resolution: decide where a job goes given what already exists.

use super::types::{ConflictPolicy, Resolution};
use crate::core::fingerprint::is_identical;
use crate::core::scanner::MediaJob;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves a job's target against the destination tree.
///
/// Only reads the filesystem; nothing is created or removed here.
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver {
    policy: ConflictPolicy,
    verify_full: bool,
}

impl ConflictResolver {
    pub fn new(policy: ConflictPolicy, verify_full: bool) -> Self {
        Self {
            policy,
            verify_full,
        }
    }

    pub fn resolve(&self, job: &MediaJob, target: PathBuf) -> Resolution {
        if !occupied(&target) {
            return Resolution::Direct(target);
        }
        if same_file(&job.path, &target) {
            return Resolution::InPlace(target);
        }
        if self.identical(job, &target) {
            return Resolution::Duplicate(target);
        }

        match self.policy {
            ConflictPolicy::Skip => Resolution::Skipped(target),
            ConflictPolicy::Overwrite => Resolution::Direct(target),
            ConflictPolicy::Rename => self.rename(job, &target),
        }
    }

    /// `stem_{fp}.ext`, then `stem_{fp}_1.ext`, `stem_{fp}_2.ext`, ...
    ///
    /// Every occupied candidate is checked for identity, so an earlier
    /// import that was itself renamed is recognized as a duplicate.
    fn rename(&self, job: &MediaJob, target: &Path) -> Resolution {
        let suffix = format!("_{}", job.fingerprint);
        let candidate = with_stem_suffix(target, &suffix);
        if !occupied(&candidate) {
            return Resolution::RenamedBySuffix {
                target: candidate,
                fingerprint: job.fingerprint,
            };
        }
        if same_file(&job.path, &candidate) {
            return Resolution::InPlace(candidate);
        }
        if self.identical(job, &candidate) {
            return Resolution::Duplicate(candidate);
        }

        let mut n: u32 = 1;
        loop {
            let candidate = with_stem_suffix(target, &format!("{suffix}_{n}"));
            if !occupied(&candidate) {
                return Resolution::RenamedByCounter {
                    target: candidate,
                    n,
                };
            }
            if same_file(&job.path, &candidate) {
                return Resolution::InPlace(candidate);
            }
            if self.identical(job, &candidate) {
                return Resolution::Duplicate(candidate);
            }
            n += 1;
        }
    }

    fn identical(&self, job: &MediaJob, existing: &Path) -> bool {
        is_identical(job, existing, self.verify_full)
    }
}

/// Whether anything exists at `path`. Unreadable paths count as occupied.
fn occupied(path: &Path) -> bool {
    match std::fs::symlink_metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != io::ErrorKind::NotFound,
    }
}

/// Whether both paths name the same file once links and `..` are resolved
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// `dir/stem.ext` -> `dir/stem{suffix}.ext`
fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}
