//! Types for the clean module.

use crate::core::import::RunStatus;
use crate::core::scanner::{DEFAULT_EXTENSIONS, DEFAULT_MIN_SIZE};
use crate::core::stats::StatsSnapshot;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which member of an identical group survives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeepPolicy {
    /// Earliest modification time
    #[default]
    Oldest,
    /// Latest modification time
    Newest,
    /// Shortest path, then lexicographically first
    ShortestPath,
}

/// What happens to the redundant copies
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CleanAction {
    /// List only
    #[default]
    Report,
    /// Move into this directory
    Trash(PathBuf),
    /// Delete permanently
    Delete,
}

impl CleanAction {
    pub fn label(&self) -> &'static str {
        match self {
            CleanAction::Report => "report",
            CleanAction::Trash(_) => "trash",
            CleanAction::Delete => "delete",
        }
    }
}

/// Configuration for a clean run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    pub root: PathBuf,
    pub keep: KeepPolicy,
    pub action: CleanAction,
    /// Group and report, change nothing
    pub dry_run: bool,
    pub extensions: Vec<String>,
    /// Minimum file size in bytes
    pub min_size: u64,
    pub include_hidden: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            keep: KeepPolicy::default(),
            action: CleanAction::default(),
            dry_run: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            min_size: DEFAULT_MIN_SIZE,
            include_hidden: false,
        }
    }
}

/// Byte-identical files found under the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    pub keeper: PathBuf,
    /// Everything else in the group, sorted by path
    pub duplicates: Vec<PathBuf>,
    pub size: u64,
    /// SHA-256, hex encoded
    pub digest: String,
}

impl DuplicateSet {
    /// Bytes freed by removing every duplicate
    pub fn reclaimable(&self) -> u64 {
        self.size * self.duplicates.len() as u64
    }
}

/// Result of a clean run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanReport {
    pub status: RunStatus,
    pub dry_run: bool,
    pub action: CleanAction,
    pub groups: Vec<DuplicateSet>,
    pub stats: StatsSnapshot,
}

impl CleanReport {
    pub fn reclaimable(&self) -> u64 {
        self.groups.iter().map(DuplicateSet::reclaimable).sum()
    }
}
