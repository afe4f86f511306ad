//! File placement: copy or move one job to its resolved target.

use super::types::TransferMode;
use crate::core::scanner::MediaJob;
use crate::error::TransferError;
use filetime::FileTime;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Places files in the destination tree
#[derive(Debug, Clone, Copy)]
pub struct Transferer {
    mode: TransferMode,
}

impl Transferer {
    pub fn new(mode: TransferMode) -> Self {
        Self { mode }
    }

    /// Copy or move `job` to `target`, returning the bytes placed.
    ///
    /// `replace` allows an existing file at `target` to be replaced;
    /// otherwise a file that appeared since resolution is left untouched and
    /// the transfer fails.
    pub fn execute(&self, job: &MediaJob, target: &Path, replace: bool) -> Result<u64, TransferError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| TransferError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        match self.mode {
            TransferMode::Copy => copy_verified(job, target, replace),
            TransferMode::Move => {
                // rename replaces silently; refuse a target that showed up late
                if !replace && fs::symlink_metadata(target).is_ok() {
                    return Err(TransferError::TargetTaken {
                        path: target.to_path_buf(),
                    });
                }
                move_file(job, target, replace)
            }
        }
    }
}

/// Rename into place; across filesystems, copy, verify, then delete
fn move_file(job: &MediaJob, target: &Path, replace: bool) -> Result<u64, TransferError> {
    match fs::rename(&job.path, target) {
        Ok(()) => Ok(job.size),
        Err(e) => {
            tracing::debug!(
                source = %job.path.display(),
                error = %e,
                "Rename failed, falling back to copy"
            );
            let bytes = copy_verified(job, target, replace)?;
            fs::remove_file(&job.path).map_err(|source| TransferError::RemoveSource {
                path: job.path.clone(),
                source,
            })?;
            Ok(bytes)
        }
    }
}

/// Copy through a temporary file beside `target`, verify the size, keep the
/// source's modification time, then persist onto `target`.
///
/// A failure at any step removes the temporary file, so no partial file is
/// ever left at `target`.
fn copy_verified(job: &MediaJob, target: &Path, replace: bool) -> Result<u64, TransferError> {
    let copy_error = |source: io::Error| TransferError::Copy {
        from: job.path.clone(),
        to: target.to_path_buf(),
        source,
    };

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(".exisort-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(copy_error)?;

    let mut input = File::open(&job.path).map_err(copy_error)?;
    io::copy(&mut input, temp.as_file_mut()).map_err(copy_error)?;
    temp.as_file().sync_all().map_err(copy_error)?;

    let written = temp.as_file().metadata().map_err(copy_error)?.len();
    let expected = input.metadata().map_err(copy_error)?.len();
    if written != expected {
        return Err(TransferError::SizeMismatch {
            path: target.to_path_buf(),
            expected,
            actual: written,
        });
    }

    persist(temp, target, replace).map_err(copy_error)?;

    let mtime = FileTime::from_system_time(job.modified);
    if let Err(e) = filetime::set_file_mtime(target, mtime) {
        tracing::warn!(path = %target.display(), error = %e, "Could not preserve modification time");
    }

    Ok(written)
}

fn persist(temp: NamedTempFile, target: &Path, replace: bool) -> io::Result<()> {
    let result = if replace {
        temp.persist(target)
    } else {
        temp.persist_noclobber(target)
    };
    result.map(|_| ()).map_err(|e| e.error)
}
