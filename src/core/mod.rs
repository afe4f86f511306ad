//! # Core Module
//!
//! The UI-agnostic import engine.
//!
//! ## Modules
//! - `exif` - Native capture-time extraction from JPEG, PNG and HEIC bytes
//! - `metadata` - Capture-time resolution: native, external fallback, mtime
//! - `scanner` - Walks a source tree and builds per-file jobs
//! - `fingerprint` - Header fingerprints and identity checks
//! - `import` - Naming, conflict resolution and the copy/move pipeline
//! - `clean` - In-place duplicate grouping
//! - `cancel` - Cooperative cancellation
//! - `stats` - Run counters

pub mod cancel;
pub mod clean;
pub mod exif;
pub mod fingerprint;
pub mod import;
pub mod metadata;
pub mod scanner;
pub mod stats;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use clean::{CleanAction, CleanConfig, CleanReport, Cleaner, KeepPolicy};
pub use import::{ConflictPolicy, ImportConfig, ImportPipeline, ImportReport, RunStatus, TransferMode};
pub use metadata::{CaptureTimeResolver, ExifTool, MetadataFallback, NoFallback, TimeSource};
pub use scanner::{MediaFile, MediaJob};
pub use stats::StatsSnapshot;
