//! # Exif Module
//!
//! Native capture-time extraction straight from container bytes.
//!
//! ## Supported containers
//! - **JPEG** - APP1 segment with the `Exif\0\0` signature
//! - **PNG** - `eXIf` chunk (raw TIFF, no signature)
//! - **HEIC/HEIF** - Exif item located through `meta`/`iinf`/`iloc`
//!
//! Every container ends up as a TIFF blob handed to the tag reader. Nothing
//! here panics on malformed input; structural problems surface as
//! [`ExifError::Unsupported`] so the caller can try another source.

mod cursor;
mod date;
mod heic;
mod jpeg;
mod png;
mod tiff;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cursor::ByteCursor;
pub use date::parse_exif_datetime;
pub use heic::{BoxHeader, Boxes, ConstructionMethod, Extent, ItemLocation};
pub use tiff::{parse_date, ByteOrder};

use crate::error::ExifError;
use chrono::NaiveDateTime;
use std::io::{Read, Seek};

/// Signature preceding the TIFF blob in JPEG APP1 and HEIC Exif items
pub const EXIF_SIGNATURE: [u8; 6] = *b"Exif\0\0";

const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const HEIC_BRANDS: [&[u8; 4]; 4] = [b"heic", b"heix", b"mif1", b"msf1"];

/// Container family, decided from the first 12 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Jpeg,
    Png,
    Heic,
    Unsupported,
}

impl Container {
    pub fn sniff(head: &[u8]) -> Self {
        if head.len() < 12 {
            return Container::Unsupported;
        }
        if head[0..2] == [0xFF, 0xD8] {
            return Container::Jpeg;
        }
        if &head[4..8] == b"ftyp" && HEIC_BRANDS.iter().any(|brand| &head[8..12] == *brand) {
            return Container::Heic;
        }
        if head[0..4] == PNG_MAGIC {
            return Container::Png;
        }
        Container::Unsupported
    }
}

/// Locate the raw TIFF blob inside a supported container.
///
/// `Ok(None)` means the container parsed cleanly but carries no Exif data.
pub fn extract_exif<R: Read + Seek>(reader: R) -> Result<Option<Vec<u8>>, ExifError> {
    let mut cursor = ByteCursor::new(reader)?;
    if cursor.len() < 12 {
        return Err(ExifError::unsupported("file too short to identify"));
    }
    let head: [u8; 12] = cursor.read_array()?;

    match Container::sniff(&head) {
        Container::Jpeg => jpeg::extract_exif(&mut cursor),
        Container::Png => png::extract_exif(&mut cursor),
        Container::Heic => {
            let item = heic::read_exif_item(&mut cursor)?;
            Ok(item.and_then(|item| heic::strip_exif_wrapper(&item).map(<[u8]>::to_vec)))
        }
        Container::Unsupported => Err(ExifError::unsupported("unrecognized container")),
    }
}

/// Read the capture time recorded inside a media file.
///
/// Returns wall-clock time as written by the camera.
pub fn read_capture_time<R: Read + Seek>(reader: R) -> Result<NaiveDateTime, ExifError> {
    let tiff = extract_exif(reader)?.ok_or(ExifError::NotFound)?;
    parse_date(&tiff)
}
