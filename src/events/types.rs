//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the import and clean pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Source tree walking
    Scan(ScanEvent),
    /// Per-file import decisions
    Import(ImportEvent),
    /// Duplicate cleaning
    Clean(CleanEvent),
    /// Run-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// A qualifying file was found and queued
    FileFound { path: PathBuf, size: u64 },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Outcome of one import job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// The file was copied or moved (or would be, in a dry run)
    Transferred {
        source: PathBuf,
        target: PathBuf,
        renamed: bool,
        dry_run: bool,
    },
    /// Identical content already sits at `existing`
    Duplicate {
        source: PathBuf,
        existing: PathBuf,
        source_removed: bool,
    },
    /// A different file occupies the target and the policy is skip
    Skipped { source: PathBuf, existing: PathBuf },
    /// The file already sits where it belongs and was left alone
    AlreadyInPlace { path: PathBuf },
    /// The transfer failed; the source is untouched
    Failed { source: PathBuf, message: String },
}

/// Events from duplicate cleaning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CleanEvent {
    /// Full hashing of size-colliding files started
    Hashing { candidates: usize },
    /// A group of identical files was found
    GroupFound {
        keeper: PathBuf,
        duplicates: Vec<PathBuf>,
    },
    /// A duplicate was acted on (or would be, in a dry run)
    Removed {
        path: PathBuf,
        action: String,
        dry_run: bool,
    },
    /// Acting on a duplicate failed
    Failed { path: PathBuf, message: String },
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A run has started
    Started { phase: PipelinePhase },
    /// The run stopped early on request
    Cancelled,
    /// The run finished
    Completed { summary: PipelineSummary },
    /// The run hit a fatal error
    Error { message: String },
}

/// Kinds of run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Importing,
    Cleaning,
}

/// Counters reported when a run finishes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub files_scanned: u64,
    pub files_processed: u64,
    pub duplicates: u64,
    pub skipped: u64,
    pub errors: u64,
    pub bytes: u64,
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Importing => write!(f, "Importing"),
            PipelinePhase::Cleaning => write!(f, "Cleaning"),
        }
    }
}
