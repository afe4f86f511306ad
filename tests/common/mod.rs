//! Shared fixtures for integration tests.

#![allow(dead_code)]

use exisort::core::fingerprint::{read_header, Fingerprint};
use std::path::Path;

/// Big-endian TIFF whose IFD0 holds a single `DateTime` entry
pub fn tiff_with_date(date: &str) -> Vec<u8> {
    let mut value = date.as_bytes().to_vec();
    value.push(0);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM");
    tiff.extend_from_slice(&42u16.to_be_bytes());
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0132u16.to_be_bytes());
    tiff.extend_from_slice(&2u16.to_be_bytes());
    tiff.extend_from_slice(&(value.len() as u32).to_be_bytes());
    tiff.extend_from_slice(&26u32.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(&value);
    tiff
}

/// Minimal JPEG carrying `date` in its Exif segment, followed by `payload`
/// so that files with the same date can still differ
pub fn jpeg(date: &str, payload: &[u8]) -> Vec<u8> {
    let tiff = tiff_with_date(date);
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out.extend_from_slice(payload);
    out
}

/// Fingerprint of a file on disk, as rendered in renamed file names
pub fn fingerprint_of(path: &Path) -> String {
    let header = read_header(path).unwrap();
    let size = std::fs::metadata(path).unwrap().len();
    Fingerprint::compute(&header, size).to_string()
}
