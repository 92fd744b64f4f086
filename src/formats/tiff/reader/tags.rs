//! Tag value reading operations

use std::io::{Read, Seek, SeekFrom};
use crate::error::{Error, Result};
use crate::io::SeekableReader;
use crate::io::byte_order::ByteOrderHandler;
use crate::formats::tiff::ifd::{EntryValue, IFDEntry};
use crate::formats::tiff::tags::{self, field_types};

/// Handles reading tag values from TIFF files
pub struct TagReader<'a> {
    reader: &'a mut dyn SeekableReader,
    handler: &'a dyn ByteOrderHandler,
}

impl<'a> TagReader<'a> {
    pub fn new(reader: &'a mut dyn SeekableReader, handler: &'a dyn ByteOrderHandler) -> Self {
        Self { reader, handler }
    }

    /// Returns the raw payload bytes of an entry, inline or from its offset
    pub fn read_bytes(&mut self, entry: &IFDEntry) -> Result<Vec<u8>> {
        match entry.value(self.handler)? {
            EntryValue::Inline(bytes) => Ok(bytes.to_vec()),
            EntryValue::AtOffset { offset, len } => {
                self.reader.seek(SeekFrom::Start(offset as u64))?;
                let mut bytes = Vec::new();
                read_at_most(&mut *self.reader, len, &mut bytes)?;
                Ok(bytes)
            }
        }
    }

    /// Reads BYTE, SHORT or LONG values widened to u32
    pub fn read_u32s(&mut self, entry: &IFDEntry) -> Result<Vec<u32>> {
        let bytes = self.read_bytes(entry)?;
        match entry.field_type {
            field_types::BYTE => Ok(bytes.into_iter().map(u32::from).collect()),
            field_types::SHORT => Ok(bytes
                .chunks_exact(2)
                .map(|c| self.handler.decode_u16([c[0], c[1]]) as u32)
                .collect()),
            field_types::LONG => Ok(bytes
                .chunks_exact(4)
                .map(|c| self.handler.decode_u32([c[0], c[1], c[2], c[3]]))
                .collect()),
            other => Err(unexpected_type(entry.tag, other, "BYTE, SHORT or LONG")),
        }
    }

    /// Reads SHORT values
    pub fn read_u16s(&mut self, entry: &IFDEntry) -> Result<Vec<u16>> {
        if entry.field_type != field_types::SHORT {
            return Err(unexpected_type(entry.tag, entry.field_type, "SHORT"));
        }
        let bytes = self.read_bytes(entry)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|c| self.handler.decode_u16([c[0], c[1]]))
            .collect())
    }

    /// Reads DOUBLE values
    pub fn read_doubles(&mut self, entry: &IFDEntry) -> Result<Vec<f64>> {
        if entry.field_type != field_types::DOUBLE {
            return Err(unexpected_type(entry.tag, entry.field_type, "DOUBLE"));
        }
        let bytes = self.read_bytes(entry)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|c| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(c);
                self.handler.decode_f64(raw)
            })
            .collect())
    }

    /// Reads an ASCII string up to its first NUL
    pub fn read_ascii(&mut self, entry: &IFDEntry) -> Result<String> {
        if entry.field_type != field_types::ASCII {
            return Err(unexpected_type(entry.tag, entry.field_type, "ASCII"));
        }
        let bytes = self.read_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Reads the first value of a BYTE/SHORT/LONG entry
    pub fn read_u32(&mut self, entry: &IFDEntry) -> Result<u32> {
        self.read_u32s(entry)?
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidFormat(format!("tag {} has no values", tags::tag_name(entry.tag))))
    }
}

/// Appends exactly `len` bytes from `reader` to `buf`
///
/// The buffer grows with the bytes actually read, so a count declared by
/// the file never sizes an allocation on its own.
pub(crate) fn read_at_most<R: Read + ?Sized>(reader: &mut R, len: usize, buf: &mut Vec<u8>) -> Result<()> {
    let read = reader
        .take(len as u64)
        .read_to_end(buf)
        .map_err(|e| Error::from_read(e, len))?;
    if read < len {
        return Err(Error::TruncatedRead { needed: len });
    }
    Ok(())
}

fn unexpected_type(tag: u16, field_type: u16, expected: &str) -> Error {
    Error::InvalidFormat(format!(
        "tag {} ({}) has type {}, expected {}",
        tag,
        tags::tag_name(tag),
        tags::field_type_name(field_type),
        expected
    ))
}
