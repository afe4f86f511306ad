//! # Metadata Module
//!
//! Resolves the capture time of a media file.
//!
//! ## Resolution order
//! 1. Native extraction from container bytes ([`crate::core::exif`])
//! 2. An external [`MetadataFallback`], only when the native parser reports
//!    the format as unsupported
//! 3. The file's modification time
//!
//! A file always ends up with a timestamp; [`TimeSource`] records which step
//! produced it.

mod exiftool;

pub use exiftool::ExifTool;

use crate::core::exif::read_capture_time;
use crate::error::ExifError;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// External source of capture times for formats the native parser rejects
pub trait MetadataFallback: Send + Sync {
    fn fetch(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Fallback that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl MetadataFallback for NoFallback {
    fn fetch(&self, _path: &Path) -> Option<NaiveDateTime> {
        None
    }
}

/// Which step of the resolution produced a capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    /// Parsed from the file's own EXIF/TIFF data
    Exif,
    /// Supplied by the external fallback
    Fallback,
    /// Filesystem modification time
    FileModified,
}

/// Native parser, then fallback, then modification time
#[derive(Clone)]
pub struct CaptureTimeResolver {
    fallback: Arc<dyn MetadataFallback>,
}

impl CaptureTimeResolver {
    pub fn new(fallback: Arc<dyn MetadataFallback>) -> Self {
        Self { fallback }
    }

    /// Resolver that never leaves the process
    pub fn native_only() -> Self {
        Self::new(Arc::new(NoFallback))
    }

    pub fn resolve(&self, path: &Path, modified: SystemTime) -> (NaiveDateTime, TimeSource) {
        match read_native(path) {
            Ok(captured) => return (captured, TimeSource::Exif),
            Err(ExifError::Unsupported(reason)) => {
                tracing::debug!(path = %path.display(), %reason, "Native parser declined, trying fallback");
                if let Some(captured) = self.fallback.fetch(path) {
                    return (captured, TimeSource::Fallback);
                }
            }
            Err(other) => {
                tracing::debug!(path = %path.display(), outcome = %other, "Using modification time");
            }
        }

        (local_time(modified), TimeSource::FileModified)
    }
}

impl Default for CaptureTimeResolver {
    fn default() -> Self {
        Self::native_only()
    }
}

impl std::fmt::Debug for CaptureTimeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureTimeResolver").finish_non_exhaustive()
    }
}

fn read_native(path: &Path) -> Result<NaiveDateTime, ExifError> {
    let file = File::open(path)?;
    read_capture_time(BufReader::new(file))
}

/// Wall-clock local time of a filesystem timestamp
pub fn local_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
