//! # Import Module
//!
//! Sorts media from a source tree into a date-based destination tree.
//!
//! ## Stages
//! 1. The scanner thread walks the source and builds a [`MediaJob`] per file
//!    (header, capture time, fingerprint)
//! 2. The transfer loop renders the target path from the [`NamingTemplate`],
//!    resolves conflicts against what already exists, then copies or moves
//!
//! ## Example
//! ```no_run
//! use exisort::core::import::{ImportPipeline, TransferMode};
//!
//! let pipeline = ImportPipeline::builder()
//!     .source("/media/card/DCIM")
//!     .destination("/photos")
//!     .mode(TransferMode::Copy)
//!     .build()?;
//! let report = pipeline.run_to_end()?;
//! println!("{} files placed", report.stats.files_processed);
//! # Ok::<(), exisort::error::ImportError>(())
//! ```
//!
//! [`MediaJob`]: crate::core::scanner::MediaJob

mod naming;
mod pipeline;
mod resolver;
mod transfer;
mod types;

pub use naming::{NamingTemplate, DEFAULT_TEMPLATE};
pub use pipeline::{ImportPipeline, ImportPipelineBuilder};
pub use resolver::ConflictResolver;
pub use transfer::Transferer;
pub use types::{
    ConflictPolicy, ImportConfig, ImportReport, Resolution, RunStatus, TransferMode,
};
