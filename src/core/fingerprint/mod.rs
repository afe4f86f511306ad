//! # Fingerprint Module
//!
//! Content identity checks, cheapest first.
//!
//! ## Levels
//! - **Fingerprint** - XXH3-64 of the header bytes and the file size. Used
//!   in rename suffixes; never trusted alone.
//! - **Header compare** - byte equality of the first 64 KiB
//! - **Full hash** - SHA-256 of the whole file, streamed

use crate::core::scanner::MediaJob;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

/// Bytes read from the start of each file for fingerprinting and comparison
pub const HEADER_LEN: usize = 64 * 1024;

const READ_BUFFER: usize = 64 * 1024;

/// Fast, non-cryptographic content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Hash `header` followed by `size` as 8 little-endian bytes
    pub fn compute(header: &[u8], size: u64) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(header);
        hasher.update(&size.to_le_bytes());
        Fingerprint(hasher.digest())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Read the first `min(HEADER_LEN, size)` bytes of a file
pub fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}

/// Streamed SHA-256 of a whole file, as lowercase hex
pub fn full_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Whether `existing` holds the same content as the job's source.
///
/// Checks size, then the in-memory header against `existing`'s first bytes,
/// then (when `verify_full`) full SHA-256 digests. Any I/O failure counts
/// as "different", which can only ever lead to keeping both files.
pub fn is_identical(job: &MediaJob, existing: &Path, verify_full: bool) -> bool {
    let Ok(metadata) = std::fs::metadata(existing) else {
        return false;
    };
    if !metadata.is_file() || metadata.len() != job.size {
        return false;
    }

    if !header_matches(existing, &job.header) {
        return false;
    }

    if verify_full {
        return match (full_hash(&job.path), full_hash(existing)) {
            (Ok(source), Ok(target)) => source == target,
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(
                    source = %job.path.display(),
                    existing = %existing.display(),
                    error = %e,
                    "Full hash failed, treating files as different"
                );
                false
            }
        };
    }

    true
}

fn header_matches(path: &Path, expected: &[u8]) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut actual = Vec::with_capacity(expected.len());
    match file.take(expected.len() as u64).read_to_end(&mut actual) {
        Ok(n) => n == expected.len() && actual == expected,
        Err(_) => false,
    }
}
