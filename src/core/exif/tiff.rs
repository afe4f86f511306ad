//! TIFF/EXIF tag reader.
//!
//! Reads IFD0 and, when present, the single Exif sub-IFD it points to.
//! GPS and thumbnail directories are never followed.

use super::date::parse_exif_datetime;
use crate::error::ExifError;
use chrono::NaiveDateTime;

pub const TAG_DATE_TIME: u16 = 0x0132;
pub const TAG_EXIF_IFD: u16 = 0x8769;
pub const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

const ENTRY_LEN: usize = 12;

/// Byte order announced by the first two bytes of a TIFF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `II`
    Little,
    /// `MM`
    Big,
}

impl ByteOrder {
    fn u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        }
    }

    fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// One 12-byte directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    /// Absolute position of the 4-byte value/offset field
    value_field: usize,
}

/// Random-access view over a raw TIFF blob
pub struct TiffReader<'a> {
    data: &'a [u8],
    order: ByteOrder,
    first_ifd: usize,
}

impl<'a> TiffReader<'a> {
    /// Validate the header: byte-order mark and magic number 42.
    pub fn new(data: &'a [u8]) -> Result<Self, ExifError> {
        if data.len() < 8 {
            return Err(ExifError::unsupported("tiff data too short"));
        }
        let order = match &data[0..2] {
            b"II" => ByteOrder::Little,
            b"MM" => ByteOrder::Big,
            _ => return Err(ExifError::unsupported("invalid tiff header")),
        };
        if order.u16([data[2], data[3]]) != 42 {
            return Err(ExifError::unsupported("invalid tiff magic number"));
        }
        let first_ifd = order.u32([data[4], data[5], data[6], data[7]]) as usize;

        Ok(Self {
            data,
            order,
            first_ifd,
        })
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes = self.data.get(offset..offset.checked_add(2)?)?;
        Some(self.order.u16([bytes[0], bytes[1]]))
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes = self.data.get(offset..offset.checked_add(4)?)?;
        Some(self.order.u32([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Entries of the directory at `offset`, read lazily.
    ///
    /// Fails up front when the entry count itself is out of bounds; an entry
    /// running past the end of the blob yields an error and ends the sequence.
    pub fn directory(&self, offset: usize) -> Result<Directory<'_, 'a>, ExifError> {
        let count = self
            .u16_at(offset)
            .ok_or_else(|| ExifError::unsupported("directory offset out of bounds"))?;
        Ok(Directory {
            reader: self,
            next: offset + 2,
            left: count,
        })
    }

    /// Value of an entry holding a 32-bit pointer (e.g. the Exif sub-IFD)
    pub fn pointer(&self, entry: &IfdEntry) -> Option<usize> {
        self.u32_at(entry.value_field).map(|v| v as usize)
    }

    /// ASCII value of an entry, cut at the first NUL and trimmed.
    ///
    /// Values of up to four bytes are stored inline in the entry.
    pub fn ascii(&self, entry: &IfdEntry) -> Option<String> {
        let len = entry.count as usize;
        let start = if len <= 4 {
            entry.value_field
        } else {
            self.u32_at(entry.value_field)? as usize
        };
        let raw = self.data.get(start..start.checked_add(len)?)?;
        let raw = match raw.iter().position(|&b| b == 0) {
            Some(nul) => &raw[..nul],
            None => raw,
        };
        let value = String::from_utf8_lossy(raw).trim().to_string();
        (!value.is_empty()).then_some(value)
    }

    /// The best available date string: `DateTimeOriginal` from the Exif
    /// sub-IFD, else `DateTime` from IFD0.
    pub fn capture_date_string(&self) -> Result<String, ExifError> {
        let ifd0 = self
            .directory(self.first_ifd)
            .and_then(|dir| dir.collect::<Result<Vec<_>, _>>())
            .map_err(|e| ExifError::unsupported(format!("tiff structure corruption: {e}")))?;

        let mut exif_ifd = None;
        let mut fallback = None;
        for entry in &ifd0 {
            match entry.tag {
                TAG_EXIF_IFD => exif_ifd = self.pointer(entry),
                TAG_DATE_TIME => fallback = self.ascii(entry),
                _ => {}
            }
        }

        // A damaged sub-IFD only costs us the entries after the damage
        if let Some(offset) = exif_ifd.filter(|&offset| offset > 0) {
            if let Ok(dir) = self.directory(offset) {
                let original = dir
                    .map_while(Result::ok)
                    .filter(|entry| entry.tag == TAG_DATE_TIME_ORIGINAL)
                    .find_map(|entry| self.ascii(&entry));
                if let Some(original) = original {
                    return Ok(original);
                }
            }
        }

        fallback.ok_or(ExifError::NoDateTag)
    }
}

/// Lazy sequence of entries in one IFD
pub struct Directory<'r, 'a> {
    reader: &'r TiffReader<'a>,
    next: usize,
    left: u16,
}

impl Iterator for Directory<'_, '_> {
    type Item = Result<IfdEntry, ExifError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.left == 0 {
            return None;
        }
        let start = self.next;
        let in_bounds = start
            .checked_add(ENTRY_LEN)
            .is_some_and(|end| end <= self.reader.data.len());
        if !in_bounds {
            self.left = 0;
            return Some(Err(ExifError::unsupported("tag entry out of bounds")));
        }

        self.left -= 1;
        self.next = start + ENTRY_LEN;
        Some(Ok(IfdEntry {
            tag: self.reader.u16_at(start)?,
            field_type: self.reader.u16_at(start + 2)?,
            count: self.reader.u32_at(start + 4)?,
            value_field: start + 8,
        }))
    }
}

/// Parse the capture date out of a raw TIFF blob
pub fn parse_date(data: &[u8]) -> Result<NaiveDateTime, ExifError> {
    let reader = TiffReader::new(data)?;
    let value = reader.capture_date_string()?;
    parse_exif_datetime(&value)
}
