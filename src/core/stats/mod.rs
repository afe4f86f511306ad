//! Run statistics shared by the scanner thread and the transfer loop.

use crate::events::PipelineSummary;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free counters, incremented from both pipeline stages
#[derive(Debug)]
pub struct Statistics {
    scanned: AtomicU64,
    processed: AtomicU64,
    duplicates: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
    bytes_moved: AtomicU64,
    started: Instant,
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            scanned: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            bytes_moved: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// A file was placed (copied, moved, or removed in clean mode)
    pub fn record_processed(&self, bytes: u64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_moved.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Freeze the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_scanned: self.scanned.load(Ordering::Relaxed),
            files_processed: self.processed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            bytes_moved: self.bytes_moved.load(Ordering::Relaxed),
            duration_ms: self.elapsed().as_millis() as u64,
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of the counters at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub files_scanned: u64,
    pub files_processed: u64,
    pub duplicates: u64,
    pub skipped: u64,
    pub errors: u64,
    pub bytes_moved: u64,
    pub duration_ms: u64,
}

impl From<&StatsSnapshot> for PipelineSummary {
    fn from(stats: &StatsSnapshot) -> Self {
        PipelineSummary {
            files_scanned: stats.files_scanned,
            files_processed: stats.files_processed,
            duplicates: stats.duplicates,
            skipped: stats.skipped,
            errors: stats.errors,
            bytes: stats.bytes_moved,
            duration_ms: stats.duration_ms,
        }
    }
}
