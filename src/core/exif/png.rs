//! PNG chunk walker: finds the `eXIf` chunk.

use super::cursor::ByteCursor;
use crate::error::ExifError;
use std::io::{Read, Seek};

const SIGNATURE_LEN: u64 = 8;

/// Largest `eXIf` payload we are willing to allocate
const MAX_EXIF_CHUNK: u32 = 10 * 1024 * 1024;

/// Return the `eXIf` payload as-is.
///
/// Unlike JPEG APP1, PNG stores the raw TIFF structure with no `Exif\0\0`
/// signature in front of it.
pub fn extract_exif<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
) -> Result<Option<Vec<u8>>, ExifError> {
    cursor.seek_to(SIGNATURE_LEN)?;

    loop {
        if cursor.remaining() < 8 {
            return Ok(None);
        }
        let length = cursor.read_u32()?;
        let kind: [u8; 4] = cursor.read_array()?;

        match &kind {
            b"eXIf" => {
                if length > MAX_EXIF_CHUNK {
                    return Err(ExifError::unsupported(format!(
                        "eXIf chunk of {length} bytes exceeds the {MAX_EXIF_CHUNK} byte limit"
                    )));
                }
                return Ok(Some(cursor.read_vec(u64::from(length))?));
            }
            b"IEND" => return Ok(None),
            // Payload plus trailing CRC
            _ => cursor.skip(u64::from(length) + 4)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exif::fixtures::{png_with_exif, tiff_blob};
    use crate::core::exif::tiff::ByteOrder;

    const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn extract(data: &[u8]) -> Result<Option<Vec<u8>>, ExifError> {
        extract_exif(&mut ByteCursor::from_slice(data))
    }

    #[test]
    fn returns_raw_tiff_payload() {
        let tiff = tiff_blob(ByteOrder::Little, None, Some("2023:05:10 14:22:31"));
        let png = png_with_exif(&tiff);

        assert_eq!(extract(&png).unwrap(), Some(tiff));
    }

    #[test]
    fn iend_before_exif_means_not_found() {
        let mut png = SIGNATURE.to_vec();
        png.extend_from_slice(&[0, 0, 0, 0]);
        png.extend_from_slice(b"IEND");
        png.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
        png.extend_from_slice(&[0, 0, 0, 4]);
        png.extend_from_slice(b"eXIf");

        assert_eq!(extract(&png).unwrap(), None);
    }

    #[test]
    fn clean_end_of_stream_means_not_found() {
        let mut png = SIGNATURE.to_vec();
        png.extend_from_slice(&[0, 0, 0, 1]);
        png.extend_from_slice(b"tEXt");
        png.extend_from_slice(&[b'x', 0, 0, 0, 0]);

        assert_eq!(extract(&png).unwrap(), None);
    }

    #[test]
    fn oversized_exif_chunk_is_rejected() {
        let mut png = SIGNATURE.to_vec();
        png.extend_from_slice(&(MAX_EXIF_CHUNK + 1).to_be_bytes());
        png.extend_from_slice(b"eXIf");
        png.extend_from_slice(&[0u8; 64]);

        assert!(extract(&png).unwrap_err().is_unsupported());
    }

    #[test]
    fn chunk_running_past_the_end_is_unsupported() {
        let mut png = SIGNATURE.to_vec();
        png.extend_from_slice(&0x0010_0000u32.to_be_bytes());
        png.extend_from_slice(b"IDAT");
        png.extend_from_slice(&[0u8; 16]);

        assert!(extract(&png).unwrap_err().is_unsupported());
    }
}
