//! # Error Module
//!
//! Error types for the photo organizer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, offsets, what went wrong
//! - **Keep failures local** - one bad file never aborts a whole run
//! - **Cancellation is not an error** - an interrupted run reports its status instead

use crate::core::stats::StatsSnapshot;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ExisortError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata error: {0}")]
    Exif(#[from] ExifError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Clean failed: {0}")]
    Clean(#[from] CleanError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while walking a source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced by bounded byte reads
#[derive(Error, Debug)]
pub enum CursorError {
    #[error("read of {len} bytes at offset {offset} exceeds bound {limit}")]
    OutOfRange { offset: u64, len: u64, limit: u64 },

    #[error("field width {width} is wider than 8 bytes")]
    FieldTooWide { width: u8 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Outcomes of native timestamp extraction that are not a timestamp.
///
/// Only [`ExifError::Unsupported`] is escalated to the external metadata
/// fallback. Every other variant resolves directly to the file's
/// modification time.
#[derive(Error, Debug)]
pub enum ExifError {
    #[error("unsupported format: {0}")]
    Unsupported(String),

    #[error("no EXIF data found")]
    NotFound,

    #[error("no date tag found")]
    NoDateTag,

    #[error("date not set")]
    DateNotSet,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExifError {
    /// Whether this outcome should be retried with the external fallback
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ExifError::Unsupported(_))
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        ExifError::Unsupported(reason.into())
    }
}

impl From<CursorError> for ExifError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                ExifError::Unsupported("truncated stream".to_string())
            }
            CursorError::Io(e) => ExifError::Io(e),
            other => ExifError::Unsupported(other.to_string()),
        }
    }
}

/// Errors that occur while copying or moving a single file
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy verification failed for {path}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Target {path} appeared after resolution; not replacing it")]
    TargetTaken { path: PathBuf },

    #[error("Failed to remove source {path}: {source}")]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level import failures
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Destination {path} is not usable: {source}")]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Naming template is empty")]
    EmptyTemplate,

    #[error("Scanner thread panicked")]
    ProducerPanicked { stats: StatsSnapshot },
}

impl ImportError {
    /// Counters accumulated before the failure; zero when the run never started
    pub fn stats(&self) -> StatsSnapshot {
        match self {
            ImportError::ProducerPanicked { stats } => *stats,
            _ => StatsSnapshot::default(),
        }
    }
}

/// Run-level clean failures
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Directory not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Trash directory {path} is not usable: {source}")]
    TrashUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ExisortError>;
