//! Directory walking implementation using walkdir.

use super::{filter::MediaFilter, MediaFile, ScanResult};
use crate::core::cancel::CancellationToken;
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Which files qualify
    pub filter: MediaFilter,
    /// Directory under the root whose subtree is not walked
    pub exclude: Option<PathBuf>,
}

/// Depth-first, name-sorted scanner built on walkdir
pub struct WalkDirScanner {
    config: ScanConfig,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Lazily walk `root`, yielding qualifying files in a stable order.
    ///
    /// Hidden directories are pruned unless hidden files are included.
    /// Per-entry failures are yielded as errors; the walk continues past them.
    pub fn walk<'a>(
        &'a self,
        root: &Path,
    ) -> Result<impl Iterator<Item = Result<MediaFile, ScanError>> + 'a, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let filter = &self.config.filter;
        let exclude = self.config.exclude.as_deref();
        let entries = walker.into_iter().filter_entry(move |entry| {
            entry.depth() == 0
                || !(is_hidden_dir(entry, filter) || exclude == Some(entry.path()))
        });

        Ok(entries.filter_map(move |entry| match entry {
            Ok(entry) => self.qualify(entry).transpose(),
            Err(e) => Some(Err(walk_error(e))),
        }))
    }

    /// Apply the filter to one entry; `Ok(None)` means "not a candidate"
    fn qualify(&self, entry: DirEntry) -> Result<Option<MediaFile>, ScanError> {
        // With links unfollowed, a link's own type is a symlink, never a file
        if !entry.file_type().is_file() {
            return Ok(None);
        }
        let filter = &self.config.filter;
        if !filter.should_include(entry.path()) {
            return Ok(None);
        }

        let metadata = entry.metadata().map_err(|e| ScanError::ReadFile {
            path: entry.path().to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("metadata unavailable")),
        })?;

        if !filter.accepts_size(metadata.len()) {
            tracing::debug!(
                path = %entry.path().display(),
                size = metadata.len(),
                "Skipping file below minimum size"
            );
            return Ok(None);
        }

        Ok(Some(MediaFile {
            path: entry.into_path(),
            size: metadata.len(),
            modified: metadata
                .modified()
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        }))
    }

    /// Walk `root` to completion, collecting files and non-fatal errors.
    ///
    /// Stops early, keeping what it found, once `token` is cancelled.
    pub fn scan(
        &self,
        root: &Path,
        token: &CancellationToken,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut files = Vec::new();
        let mut errors = Vec::new();

        for item in self.walk(root)? {
            if token.is_cancelled() {
                break;
            }
            match item {
                Ok(file) => {
                    events.send(Event::Scan(ScanEvent::FileFound {
                        path: file.path.clone(),
                        size: file.size,
                    }));
                    files.push(file);
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Skipping unreadable entry");
                    events.send(Event::Scan(ScanEvent::Error {
                        path: error_path(&error),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: files.len(),
        }));

        Ok(ScanResult { files, errors })
    }
}

fn is_hidden_dir(entry: &DirEntry, filter: &MediaFilter) -> bool {
    entry.file_type().is_dir() && filter.is_hidden(entry.path())
}

fn walk_error(e: walkdir::Error) -> ScanError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();

    if e.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
        ScanError::PermissionDenied { path }
    } else {
        ScanError::ReadDirectory {
            path,
            source: std::io::Error::other(e.to_string()),
        }
    }
}

/// Path an error refers to, for reporting
pub fn error_path(error: &ScanError) -> PathBuf {
    match error {
        ScanError::DirectoryNotFound { path }
        | ScanError::PermissionDenied { path }
        | ScanError::ReadDirectory { path, .. }
        | ScanError::ReadFile { path, .. } => path.clone(),
    }
}
