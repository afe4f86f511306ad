//! ISOBMFF (HEIC/HEIF) box walker and Exif item resolver.
//!
//! The Exif payload of a HEIC file is an *item*: `iinf` names it, `iloc`
//! says where its bytes live (absolute file offsets or offsets into an
//! `idat` box), possibly split across several extents.

use super::cursor::ByteCursor;
use super::EXIF_SIGNATURE;
use crate::error::ExifError;
use std::fmt;
use std::io::{Read, Seek};

/// Four-character box or item type code
pub type FourCc = [u8; 4];

/// Upper bound on an assembled item; real Exif items are a few KiB
const MAX_ITEM_SIZE: u64 = 16 * 1024 * 1024;

/// Upper bound on extents kept for the Exif item across all `iloc` entries
const MAX_EXTENTS: usize = 1024;

/// How far into an item payload to look for a bare TIFF header
const TIFF_SEARCH_WINDOW: usize = 512;

/// Header of one length-prefixed box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub kind: FourCc,
    pub offset: u64,
    pub size: u64,
    pub payload_offset: u64,
    pub payload_size: u64,
}

impl BoxHeader {
    /// Read the header of the box starting at `offset`.
    ///
    /// Size 1 means a 64-bit size follows the type; size 0 means the box runs
    /// to the end of the stream.
    pub fn read<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        offset: u64,
    ) -> Result<Self, ExifError> {
        cursor.seek_to(offset)?;
        let compact = cursor.read_u32()?;
        let kind: FourCc = cursor.read_array()?;

        let (size, header_len) = match compact {
            1 => (cursor.read_u64()?, 16),
            0 => (cursor.len() - offset, 8),
            n => (u64::from(n), 8),
        };

        if size < header_len {
            return Err(ExifError::unsupported(format!(
                "box '{}' size ({size}) is smaller than its header ({header_len})",
                FourCcDisplay(&kind)
            )));
        }

        Ok(Self {
            kind,
            offset,
            size,
            payload_offset: offset + header_len,
            payload_size: size - header_len,
        })
    }

    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

struct FourCcDisplay<'a>(&'a FourCc);

impl fmt::Display for FourCcDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0))
    }
}

/// Lazy sequence of sibling boxes within `[start, end)`.
///
/// Ends when fewer than 8 bytes remain or after the first error.
pub struct Boxes<'c, R> {
    cursor: &'c mut ByteCursor<R>,
    pos: u64,
    end: u64,
    done: bool,
}

impl<'c, R: Read + Seek> Boxes<'c, R> {
    pub fn new(cursor: &'c mut ByteCursor<R>, start: u64, end: u64) -> Self {
        let end = end.min(cursor.len());
        Self {
            cursor,
            pos: start,
            end,
            done: false,
        }
    }
}

impl<R: Read + Seek> Iterator for Boxes<'_, R> {
    type Item = Result<BoxHeader, ExifError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.end.saturating_sub(self.pos) < 8 {
            return None;
        }

        let header = match BoxHeader::read(self.cursor, self.pos) {
            Ok(header) => header,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        match self.pos.checked_add(header.size) {
            Some(next) if header.size > 0 => self.pos = next,
            _ => {
                self.done = true;
                return Some(Err(ExifError::unsupported("box size overflows the stream")));
            }
        }
        Some(Ok(header))
    }
}

/// First box of type `kind` among the siblings in `[start, end)`
pub fn find_box<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    start: u64,
    end: u64,
    kind: &FourCc,
) -> Result<Option<BoxHeader>, ExifError> {
    Boxes::new(cursor, start, end)
        .find(|item| !matches!(item, Ok(header) if &header.kind != kind))
        .transpose()
}

/// Addressing scheme of an item's extents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionMethod {
    /// Offsets are absolute file positions
    Absolute,
    /// Offsets are relative to the payload of the `idat` box
    IdatRelative,
    /// Item-reference construction; read as absolute
    Other(u8),
}

impl From<u16> for ConstructionMethod {
    fn from(raw: u16) -> Self {
        match raw & 0x000F {
            0 => ConstructionMethod::Absolute,
            1 => ConstructionMethod::IdatRelative,
            n => ConstructionMethod::Other(n as u8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub offset: u64,
    pub length: u64,
}

/// Where one item's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLocation {
    pub item_id: u32,
    pub construction_method: ConstructionMethod,
    pub base_offset: u64,
    pub extents: Vec<Extent>,
}

/// Locate and assemble the raw Exif item payload.
///
/// `Ok(None)` means the file has no `meta`, `iinf` or `iloc` box at all.
/// Anything structurally wrong inside them is [`ExifError::Unsupported`].
pub fn read_exif_item<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
) -> Result<Option<Vec<u8>>, ExifError> {
    let stream_end = cursor.len();
    let Some(meta) = find_box(cursor, 0, stream_end, b"meta")? else {
        return Ok(None);
    };
    if meta.payload_size < 4 {
        return Err(ExifError::unsupported("meta box too small"));
    }
    // Full box: version and flags precede the children
    let children_start = meta.payload_offset + 4;
    let children_end = meta.end();

    let Some(iinf) = find_box(cursor, children_start, children_end, b"iinf")? else {
        return Ok(None);
    };
    let iinf_payload = cursor.read_at(iinf.payload_offset, iinf.payload_size)?;
    let exif_ids = exif_item_ids(&iinf_payload)?;
    let Some(&target) = exif_ids.first() else {
        return Err(ExifError::unsupported(
            "no supported Exif item info found (possible infe version mismatch)",
        ));
    };

    let Some(iloc) = find_box(cursor, children_start, children_end, b"iloc")? else {
        return Ok(None);
    };
    let iloc_payload = cursor.read_at(iloc.payload_offset, iloc.payload_size)?;
    let locations = parse_iloc(&iloc_payload, target)?;
    if locations.is_empty() {
        return Err(ExifError::unsupported(
            "exif item location definition not found",
        ));
    }

    let needs_idat = locations
        .iter()
        .any(|loc| loc.construction_method == ConstructionMethod::IdatRelative);
    let idat = if needs_idat {
        match find_box(cursor, children_start, children_end, b"idat")? {
            Some(found) => Some(found),
            None => find_box(cursor, 0, stream_end, b"idat")?,
        }
    } else {
        None
    };

    assemble_item(cursor, &locations, idat.map(|b| b.payload_offset)).map(Some)
}

/// Item IDs whose `infe` declares type `Exif`, in box order.
///
/// `payload` is the full-box payload of `iinf`.
pub fn exif_item_ids(payload: &[u8]) -> Result<Vec<u32>, ExifError> {
    if payload.len() < 4 {
        return Err(ExifError::unsupported("iinf too small"));
    }
    let entry_count_len = if payload[0] == 0 { 2 } else { 4 };
    let children_start = 4 + entry_count_len;

    let mut cursor = ByteCursor::from_slice(payload);
    let end = cursor.len();
    let mut ids = Vec::new();

    for header in Boxes::new(&mut cursor, children_start, end) {
        let header = header?;
        if &header.kind != b"infe" || header.payload_size < 12 {
            continue;
        }
        let start = header.payload_offset as usize;
        let len = header.payload_size.min(16) as usize;
        let Some(infe) = payload.get(start..start + len) else {
            continue;
        };

        let (item_id, item_type) = match infe[0] {
            2 => (
                u32::from(u16::from_be_bytes([infe[4], infe[5]])),
                infe.get(8..12),
            ),
            3 => (
                u32::from_be_bytes([infe[4], infe[5], infe[6], infe[7]]),
                infe.get(10..14),
            ),
            // Versions 0/1 carry no item type
            _ => continue,
        };

        if item_type == Some(b"Exif".as_slice()) {
            ids.push(item_id);
        }
    }

    Ok(ids)
}

/// Parse the full-box payload of `iloc`, keeping only `target`'s locations.
pub fn parse_iloc(payload: &[u8], target: u32) -> Result<Vec<ItemLocation>, ExifError> {
    let mut cursor = ByteCursor::from_slice(payload);

    let version = cursor.read_u8()?;
    cursor.skip(3)?;

    let sizes: [u8; 2] = cursor.read_array()?;
    let offset_size = sizes[0] >> 4;
    let length_size = sizes[0] & 0x0F;
    let base_offset_size = sizes[1] >> 4;
    let index_size = if version >= 1 { sizes[1] & 0x0F } else { 0 };

    let item_count = if version < 2 {
        u32::from(cursor.read_u16()?)
    } else {
        cursor.read_u32()?
    };

    let mut locations = Vec::new();
    let mut retained = 0usize;
    for _ in 0..item_count {
        let item_id = if version < 2 {
            u32::from(cursor.read_u16()?)
        } else {
            cursor.read_u32()?
        };

        let construction_method = if version == 1 || version == 2 {
            ConstructionMethod::from(cursor.read_u16()?)
        } else {
            ConstructionMethod::Absolute
        };

        // Data reference index
        cursor.skip(2)?;
        let base_offset = cursor.read_uint(base_offset_size)?;
        let extent_count = cursor.read_u16()?;

        // With every width zero the extents carry no bytes and locate nothing
        let extent_width = u64::from(index_size) + u64::from(offset_size) + u64::from(length_size);
        if extent_width == 0 {
            continue;
        }
        if extent_width * u64::from(extent_count) > cursor.remaining() {
            return Err(ExifError::unsupported("iloc extent count exceeds box"));
        }

        let is_target = item_id == target;
        let mut extents = Vec::new();
        for _ in 0..extent_count {
            if index_size > 0 {
                cursor.read_uint(index_size)?;
            }
            let offset = cursor.read_uint(offset_size)?;
            let length = cursor.read_uint(length_size)?;
            if is_target && length > 0 {
                extents.push(Extent { offset, length });
            }
        }

        if is_target {
            retained += extents.len();
            if retained > MAX_EXTENTS {
                return Err(ExifError::unsupported("too many extents for exif item"));
            }
        }

        if is_target {
            locations.push(ItemLocation {
                item_id,
                construction_method,
                base_offset,
                extents,
            });
        }
    }

    Ok(locations)
}

/// Concatenate an item's extents in order.
pub fn assemble_item<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    locations: &[ItemLocation],
    idat_offset: Option<u64>,
) -> Result<Vec<u8>, ExifError> {
    let mut out = Vec::new();

    for location in locations {
        for extent in &location.extents {
            let origin = match location.construction_method {
                ConstructionMethod::IdatRelative => idat_offset.ok_or_else(|| {
                    ExifError::unsupported(
                        "item uses idat-relative offsets but no idat box was found",
                    )
                })?,
                ConstructionMethod::Absolute | ConstructionMethod::Other(_) => 0,
            };

            if extent.length == 0 {
                continue;
            }
            if out.len() as u64 + extent.length > MAX_ITEM_SIZE {
                return Err(ExifError::unsupported("exif item exceeds size limit"));
            }

            let start = origin
                .checked_add(location.base_offset)
                .and_then(|offset| offset.checked_add(extent.offset))
                .ok_or_else(|| ExifError::unsupported("extent offset overflows"))?;
            out.extend_from_slice(&cursor.read_at(start, extent.length)?);
        }
    }

    Ok(out)
}

/// Strip the HEIC Exif wrapper to expose the TIFF blob.
///
/// The wrapper is a 4-byte big-endian offset to the signature, padding,
/// then `Exif\0\0`. When the signature is not where the offset says, the
/// first 512 bytes are searched for a bare TIFF header instead.
pub fn strip_exif_wrapper(item: &[u8]) -> Option<&[u8]> {
    if let Some(prefix) = item.get(0..4) {
        let to_signature = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        let signature_start = 4usize.saturating_add(to_signature as usize);
        let signature_end = signature_start.saturating_add(EXIF_SIGNATURE.len());
        if item.get(signature_start..signature_end) == Some(EXIF_SIGNATURE.as_slice()) {
            return Some(&item[signature_end..]);
        }
    }

    find_tiff_header(item).map(|start| &item[start..])
}

fn find_tiff_header(data: &[u8]) -> Option<usize> {
    let window = &data[..data.len().min(TIFF_SEARCH_WINDOW)];
    window
        .windows(4)
        .position(|w| w == b"II*\0" || w == b"MM\0*")
}
