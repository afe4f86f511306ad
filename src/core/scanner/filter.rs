//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Extensions imported when none are configured
pub const DEFAULT_EXTENSIONS: [&str; 14] = [
    "jpg", "jpeg", "png", "heic", "heif", "mov", "mp4", "m4v", "avi", "arw", "cr2", "cr3", "dng",
    "nef",
];

/// Default minimum file size (32 KiB); smaller files are thumbnails or junk
pub const DEFAULT_MIN_SIZE: u64 = 32 * 1024;

/// Decides which files the scanner yields
#[derive(Debug, Clone)]
pub struct MediaFilter {
    /// Lowercase extensions without the dot
    extensions: HashSet<String>,
    /// Files smaller than this are ignored
    min_size: u64,
    /// Whether to include hidden files and directories
    include_hidden: bool,
}

impl MediaFilter {
    /// Create a filter with the default extensions and minimum size
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            min_size: DEFAULT_MIN_SIZE,
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept.
    ///
    /// Matching is case-insensitive and a leading dot is ignored.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    pub fn min_size(&self) -> u64 {
        self.min_size
    }

    pub fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Whether a name should be skipped as hidden
    pub fn is_hidden(&self, path: &Path) -> bool {
        !self.include_hidden
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Check the path-only rules: hidden name and extension
    pub fn should_include(&self, path: &Path) -> bool {
        if self.is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// Check the size rule
    pub fn accepts_size(&self, size: u64) -> bool {
        size >= self.min_size
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a comma-separated extension list such as `"jpg, .PNG,heic"`
pub fn parse_extension_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
