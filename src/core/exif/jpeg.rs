//! JPEG marker scanner: finds the APP1 segment carrying `Exif\0\0`.

use super::cursor::ByteCursor;
use super::EXIF_SIGNATURE;
use crate::error::{CursorError, ExifError};
use std::io::{Read, Seek};

/// Total bytes consumed before giving up on a stream
const MAX_SCAN: u64 = 1 << 20;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP1: u8 = 0xE1;
const TEM: u8 = 0x01;

/// Return the TIFF blob following the Exif signature, if any.
///
/// Scanning stops at EOI or SOS (entropy-coded data follows, so no further
/// metadata segments can appear), at end of stream, or after 1 MiB.
pub fn extract_exif<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
) -> Result<Option<Vec<u8>>, ExifError> {
    cursor.seek_to(0)?;
    let mut scanned: u64 = 0;

    while scanned < MAX_SCAN {
        let Some(byte) = next_byte(cursor)? else {
            return Ok(None);
        };
        scanned += 1;
        if byte != 0xFF {
            continue;
        }

        // Fill bytes: any run of 0xFF before the marker code
        let marker = loop {
            let Some(code) = next_byte(cursor)? else {
                return Ok(None);
            };
            scanned += 1;
            if code != 0xFF {
                break code;
            }
        };

        match marker {
            SOI | TEM | 0xD0..=0xD7 => continue,
            EOI | SOS => return Ok(None),
            _ => {}
        }

        if cursor.remaining() < 2 {
            return Ok(None);
        }
        let declared = cursor.read_u16()?;
        if declared < 2 {
            return Err(ExifError::unsupported(format!(
                "segment 0x{marker:02X} declares length {declared}"
            )));
        }
        scanned += 2;
        let mut length = u64::from(declared - 2);

        if marker == APP1 && length >= EXIF_SIGNATURE.len() as u64 {
            let signature: [u8; 6] = cursor.read_array()?;
            if signature == EXIF_SIGNATURE {
                return Ok(Some(cursor.read_vec(length - 6)?));
            }
            length -= 6;
            scanned += 6;
        }

        if length > MAX_SCAN.saturating_sub(scanned) {
            return Ok(None);
        }
        cursor.skip(length)?;
        scanned += length;
    }

    Ok(None)
}

fn next_byte<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Option<u8>, CursorError> {
    if cursor.remaining() == 0 {
        return Ok(None);
    }
    cursor.read_u8().map(Some)
}
