//! # exisort
//!
//! A safe photo organizer: sorts media into a date-based tree using the
//! capture time recorded inside each file.
//!
//! ## Core Philosophy
//! - **Never duplicate** - re-running an import recognizes content already in place
//! - **Never lose** - a differing file at the target path is kept, the newcomer is renamed
//! - **Stay fast** - timestamps come straight from container bytes, not a metadata library
//!
//! ## Architecture
//! - `core` - Timestamp extraction, fingerprinting, import and clean pipelines
//! - `events` - Event-driven progress reporting
//! - `error` - Error types for every subsystem
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ExisortError, Result};

/// Initialize tracing for the library.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` picks between `info` and
/// `debug` for this crate.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "exisort=debug" } else { "exisort=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    // A subscriber may already be installed (tests, embedding applications)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
