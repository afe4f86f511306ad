//! Types for the import module.

use super::naming::DEFAULT_TEMPLATE;
use crate::core::fingerprint::Fingerprint;
use crate::core::scanner::{DEFAULT_EXTENSIONS, DEFAULT_MIN_SIZE};
use crate::core::stats::StatsSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whether sources stay in place
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Copy files to the destination (keep originals)
    #[default]
    Copy,
    /// Move files to the destination
    Move,
}

/// What to do when a different file already sits at the target path
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep both: the newcomer gets a fingerprint suffix
    #[default]
    Rename,
    /// Leave the newcomer where it is
    Skip,
    /// Replace the existing file
    Overwrite,
}

/// Configuration for an import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Naming template, relative to `destination`
    pub template: String,
    pub mode: TransferMode,
    pub conflict: ConflictPolicy,
    /// Resolve everything, change nothing
    pub dry_run: bool,
    /// Compare full SHA-256 digests before calling two files identical
    pub deep_check: bool,
    pub extensions: Vec<String>,
    /// Minimum file size in bytes
    pub min_size: u64,
    pub include_hidden: bool,
    /// Capacity of the scanner-to-transfer queue
    pub queue_capacity: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            template: DEFAULT_TEMPLATE.to_string(),
            mode: TransferMode::default(),
            conflict: ConflictPolicy::default(),
            dry_run: false,
            deep_check: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            min_size: DEFAULT_MIN_SIZE,
            include_hidden: false,
            queue_capacity: 100,
        }
    }
}

impl ImportConfig {
    /// Full-content verification is mandatory whenever a source may be deleted
    pub fn verify_full(&self) -> bool {
        self.deep_check || self.mode == TransferMode::Move
    }
}

/// Where a job ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Target is free (or is to be overwritten)
    Direct(PathBuf),
    /// Identical content already exists at this path
    Duplicate(PathBuf),
    /// A different file holds the target and the policy is skip
    Skipped(PathBuf),
    /// The source already sits at this path; nothing to do
    InPlace(PathBuf),
    /// Target taken; `stem_{fingerprint}.ext` is free
    RenamedBySuffix {
        target: PathBuf,
        fingerprint: Fingerprint,
    },
    /// Suffix taken too; `stem_{fingerprint}_{n}.ext` is free
    RenamedByCounter { target: PathBuf, n: u32 },
}

impl Resolution {
    /// The path this resolution refers to
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Direct(path)
            | Resolution::Duplicate(path)
            | Resolution::Skipped(path)
            | Resolution::InPlace(path)
            | Resolution::RenamedBySuffix { target: path, .. }
            | Resolution::RenamedByCounter { target: path, .. } => path,
        }
    }

    pub fn is_renamed(&self) -> bool {
        matches!(
            self,
            Resolution::RenamedBySuffix { .. } | Resolution::RenamedByCounter { .. }
        )
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Stopped early on request; finished transfers remain in place
    Interrupted,
}

/// Result of an import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub status: RunStatus,
    pub dry_run: bool,
    pub stats: StatsSnapshot,
}
