//! I/O primitives for the TIFF codec
//!
//! Byte-order aware reading from any seekable source and positioned
//! writing into a pre-sized buffer.

pub mod byte_order;
pub mod writer;

use std::io::{Read, Seek};

pub use byte_order::ByteOrder;
pub use writer::ByteWriter;

/// Source the directory parser can read from and seek within
///
/// Implemented for anything that is [`Read`] + [`Seek`] + [`Send`] +
/// [`Sync`]: files, buffered files, memory maps behind a cursor and
/// in-memory byte vectors.
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
