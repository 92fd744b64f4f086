//! Positioned writing into a pre-sized output buffer

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::io::byte_order::ByteOrderHandler;

/// Writes values in one byte order at explicit positions of a fixed buffer
///
/// The buffer is sized up front from a computed layout, so every write
/// either lands inside it or fails; nothing is ever appended.
pub struct ByteWriter {
    buffer: Vec<u8>,
    pos: usize,
    handler: Box<dyn ByteOrderHandler>,
}

impl ByteWriter {
    /// Creates a zero-filled buffer of `size` bytes
    pub fn new(size: usize, byte_order: ByteOrder) -> Self {
        Self {
            buffer: vec![0; size],
            pos: 0,
            handler: byte_order.handler(),
        }
    }

    /// Moves the write position
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buffer.len() {
            return Err(Error::Invalid(format!(
                "write position {} beyond buffer of {} bytes",
                pos,
                self.buffer.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Returns the current write position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Writes raw bytes at the current position
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        if end > self.buffer.len() {
            return Err(Error::Invalid(format!(
                "write of {} bytes at {} overruns buffer of {} bytes",
                bytes.len(),
                self.pos,
                self.buffer.len()
            )));
        }
        self.buffer[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        let bytes = self.handler.encode_u16(value);
        self.write_bytes(&bytes)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let bytes = self.handler.encode_u32(value);
        self.write_bytes(&bytes)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let bytes = self.handler.encode_u64(value);
        self.write_bytes(&bytes)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        let bytes = self.handler.encode_f64(value);
        self.write_bytes(&bytes)
    }

    /// Consumes the writer and returns the buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}
