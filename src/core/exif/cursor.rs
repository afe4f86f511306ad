//! Bounded reader over a seekable byte source.
//!
//! Every read is checked against the stream length before it touches the
//! underlying reader, so a corrupt length field surfaces as
//! [`CursorError::OutOfRange`] instead of a short or misplaced read.

use crate::error::CursorError;
use std::io::{self, Read, Seek, SeekFrom};

/// Sequential/random-access reader that owns its position and its bound.
///
/// All multi-byte integers are big-endian: JPEG, PNG and ISOBMFF all store
/// their framing that way. TIFF byte order is handled by the tag reader.
pub struct ByteCursor<R> {
    inner: R,
    pos: u64,
    limit: u64,
}

impl<'a> ByteCursor<io::Cursor<&'a [u8]>> {
    /// Cursor over an in-memory buffer, typically a box payload
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self {
            inner: io::Cursor::new(data),
            pos: 0,
            limit: data.len() as u64,
        }
    }
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a reader; the bound is the length of the stream.
    pub fn new(mut inner: R) -> Result<Self, CursorError> {
        let limit = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            pos: 0,
            limit,
        })
    }

    /// Total length of the underlying stream
    pub fn len(&self) -> u64 {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes left between the current position and the bound
    pub fn remaining(&self) -> u64 {
        self.limit - self.pos
    }

    fn ensure(&self, offset: u64, len: u64) -> Result<(), CursorError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(CursorError::OutOfRange {
                offset,
                len,
                limit: self.limit,
            }),
        }
    }

    pub fn seek_to(&mut self, offset: u64) -> Result<(), CursorError> {
        self.ensure(offset, 0)?;
        self.inner.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, len: u64) -> Result<(), CursorError> {
        self.ensure(self.pos, len)?;
        self.seek_to(self.pos + len)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), CursorError> {
        self.ensure(self.pos, buf.len() as u64)?;
        self.inner.read_exact(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian unsigned integer `width` bytes wide (0..=8).
    ///
    /// A zero width yields 0 without consuming anything.
    pub fn read_uint(&mut self, width: u8) -> Result<u64, CursorError> {
        if width > 8 {
            return Err(CursorError::FieldTooWide { width });
        }
        let mut buf = [0u8; 8];
        let start = 8 - usize::from(width);
        self.read_exact(&mut buf[start..])?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Read `len` bytes into a fresh buffer.
    ///
    /// The bound check happens before allocation, so the buffer can never
    /// exceed what the stream actually holds.
    pub fn read_vec(&mut self, len: u64) -> Result<Vec<u8>, CursorError> {
        self.ensure(self.pos, len)?;
        let size = usize::try_from(len).map_err(|_| CursorError::OutOfRange {
            offset: self.pos,
            len,
            limit: self.limit,
        })?;
        let mut buf = vec![0u8; size];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Seek to `offset` and read `len` bytes
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>, CursorError> {
        self.seek_to(offset)?;
        self.read_vec(len)
    }
}
