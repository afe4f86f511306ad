//! # Scanner Module
//!
//! Discovers media files in a source tree.
//!
//! ## Rules
//! - Depth-first, entries sorted by file name, so runs are repeatable
//! - Case-insensitive extension allow-list (photos, RAW and video)
//! - Files below a minimum size are ignored
//! - Hidden files and directories are skipped unless asked for
//!
//! ## Example
//! ```rust,ignore
//! use exisort::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! for file in scanner.walk("/Volumes/CARD/DCIM".as_ref())? {
//!     println!("{}", file?.path.display());
//! }
//! ```

mod filter;
mod job;
mod walker;

pub use filter::{parse_extension_list, MediaFilter, DEFAULT_EXTENSIONS, DEFAULT_MIN_SIZE};
pub use job::MediaJob;
pub use walker::{error_path, ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A file that passed the scanner's filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
}

/// Result of a complete scan
#[derive(Debug)]
pub struct ScanResult {
    /// Files that qualified
    pub files: Vec<MediaFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}
