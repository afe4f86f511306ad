//! Per-file work item handed from the scanner to the transfer loop.

use super::MediaFile;
use crate::core::fingerprint::{read_header, Fingerprint};
use crate::core::metadata::{CaptureTimeResolver, TimeSource};
use crate::error::ScanError;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::SystemTime;

/// Everything the transfer loop needs to place one file.
///
/// Built once by the scanner thread and consumed exactly once.
#[derive(Debug, Clone)]
pub struct MediaJob {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    /// Always populated: EXIF, external fallback, or modification time
    pub captured_at: NaiveDateTime,
    pub time_source: TimeSource,
    pub fingerprint: Fingerprint,
    /// The first `min(64 KiB, size)` bytes of the file
    pub header: Vec<u8>,
}

impl MediaJob {
    /// Read the header, resolve the capture time and fingerprint the file
    pub fn build(file: MediaFile, resolver: &CaptureTimeResolver) -> Result<Self, ScanError> {
        let header = read_header(&file.path).map_err(|source| ScanError::ReadFile {
            path: file.path.clone(),
            source,
        })?;
        let (captured_at, time_source) = resolver.resolve(&file.path, file.modified);
        let fingerprint = Fingerprint::compute(&header, file.size);

        tracing::debug!(
            path = %file.path.display(),
            %captured_at,
            source = ?time_source,
            %fingerprint,
            "Prepared job"
        );

        Ok(Self {
            path: file.path,
            size: file.size,
            modified: file.modified,
            captured_at,
            time_source,
            fingerprint,
            header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exif::fixtures::{jpeg_with_exif, tiff_blob};
    use crate::core::exif::ByteOrder;
    use tempfile::TempDir;

    fn media_file(path: PathBuf) -> MediaFile {
        let metadata = std::fs::metadata(&path).unwrap();
        MediaFile {
            path,
            size: metadata.len(),
            modified: metadata.modified().unwrap(),
        }
    }

    #[test]
    fn builds_job_from_exif_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("IMG_0001.jpg");
        let jpeg = jpeg_with_exif(&tiff_blob(ByteOrder::Little, Some("2023:05:10 14:22:31"), None));
        std::fs::write(&path, &jpeg).unwrap();

        let job = MediaJob::build(media_file(path), &CaptureTimeResolver::native_only()).unwrap();

        assert_eq!(job.time_source, TimeSource::Exif);
        assert_eq!(job.captured_at.to_string(), "2023-05-10 14:22:31");
        assert_eq!(job.header, jpeg);
        assert_eq!(job.fingerprint, Fingerprint::compute(&jpeg, jpeg.len() as u64));
    }

    #[test]
    fn header_is_capped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.mov");
        std::fs::write(&path, vec![7u8; 100 * 1024]).unwrap();

        let job = MediaJob::build(media_file(path), &CaptureTimeResolver::native_only()).unwrap();

        assert_eq!(job.header.len(), 64 * 1024);
        assert_eq!(job.size, 100 * 1024);
        assert_eq!(job.time_source, TimeSource::FileModified);
    }

    #[test]
    fn vanished_file_is_a_scan_error() {
        let file = MediaFile {
            path: PathBuf::from("/nonexistent/IMG_0001.jpg"),
            size: 10,
            modified: SystemTime::UNIX_EPOCH,
        };
        let result = MediaJob::build(file, &CaptureTimeResolver::native_only());
        assert!(matches!(result, Err(ScanError::ReadFile { .. })));
    }
}
