//! Byte order (endianness) handling
//!
//! Provides utilities for reading and writing multi-byte values in either
//! byte order. The order is selected once per file from the two-byte marker
//! at the start of the TIFF header.

use std::io::Read;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::io::SeekableReader;

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    #[default]
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

impl ByteOrder {
    /// Detects byte order from TIFF magic bytes
    ///
    /// TIFF files start with either "II" (0x4949) for little-endian
    /// or "MM" (0x4D4D) for big-endian.
    pub fn from_tiff_magic(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    /// Returns the two marker bytes written at the start of a file
    pub fn tiff_magic(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }

    /// Reads and detects byte order from a reader
    pub fn detect<R: SeekableReader>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic).map_err(|e| Error::from_read(e, 2))?;

        Self::from_tiff_magic(magic)
            .ok_or_else(|| Error::InvalidByteOrder(u16::from_be_bytes(magic)))
    }

    /// Creates a handler for this byte order
    pub fn handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndian),
            ByteOrder::BigEndian => Box::new(BigEndian),
        }
    }
}

fn read_array<const N: usize>(reader: &mut dyn SeekableReader) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| Error::from_read(e, N))?;
    Ok(buf)
}

/// Encodes and decodes fixed-width values in one byte order
///
/// Only the integer conversions differ between orders; stream reads and
/// doubles are layered on top of them.
pub trait ByteOrderHandler: Send + Sync {
    fn decode_u16(&self, bytes: [u8; 2]) -> u16;
    fn decode_u32(&self, bytes: [u8; 4]) -> u32;
    fn decode_u64(&self, bytes: [u8; 8]) -> u64;

    fn encode_u16(&self, value: u16) -> [u8; 2];
    fn encode_u32(&self, value: u32) -> [u8; 4];
    fn encode_u64(&self, value: u64) -> [u8; 8];

    /// Reinterprets 8 bytes in this order as an IEEE-754 double
    fn decode_f64(&self, bytes: [u8; 8]) -> f64 {
        f64::from_bits(self.decode_u64(bytes))
    }

    fn encode_f64(&self, value: f64) -> [u8; 8] {
        self.encode_u64(value.to_bits())
    }

    /// Reads an unsigned 16-bit integer
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        Ok(self.decode_u16(read_array(reader)?))
    }

    /// Reads an unsigned 32-bit integer
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        Ok(self.decode_u32(read_array(reader)?))
    }

    /// Reads an unsigned 64-bit integer
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        Ok(self.decode_u64(read_array(reader)?))
    }

    /// Reads a 64-bit floating point number
    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        Ok(self.decode_f64(read_array(reader)?))
    }
}

struct LittleEndian;

impl ByteOrderHandler for LittleEndian {
    fn decode_u16(&self, bytes: [u8; 2]) -> u16 {
        u16::from_le_bytes(bytes)
    }

    fn decode_u32(&self, bytes: [u8; 4]) -> u32 {
        u32::from_le_bytes(bytes)
    }

    fn decode_u64(&self, bytes: [u8; 8]) -> u64 {
        u64::from_le_bytes(bytes)
    }

    fn encode_u16(&self, value: u16) -> [u8; 2] {
        value.to_le_bytes()
    }

    fn encode_u32(&self, value: u32) -> [u8; 4] {
        value.to_le_bytes()
    }

    fn encode_u64(&self, value: u64) -> [u8; 8] {
        value.to_le_bytes()
    }
}

struct BigEndian;

impl ByteOrderHandler for BigEndian {
    fn decode_u16(&self, bytes: [u8; 2]) -> u16 {
        u16::from_be_bytes(bytes)
    }

    fn decode_u32(&self, bytes: [u8; 4]) -> u32 {
        u32::from_be_bytes(bytes)
    }

    fn decode_u64(&self, bytes: [u8; 8]) -> u64 {
        u64::from_be_bytes(bytes)
    }

    fn encode_u16(&self, value: u16) -> [u8; 2] {
        value.to_be_bytes()
    }

    fn encode_u32(&self, value: u32) -> [u8; 4] {
        value.to_be_bytes()
    }

    fn encode_u64(&self, value: u64) -> [u8; 8] {
        value.to_be_bytes()
    }
}
