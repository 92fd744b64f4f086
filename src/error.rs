//! Error types for geolayers

use std::io;
use thiserror::Error;

/// Result type for geolayers operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes every [`Error`] falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be opened, created, read or written
    Io,
    /// Fewer bytes were available than a read required
    TruncatedRead,
    /// The bytes are not a container this codec understands
    Format,
    /// The bytes or the data model violate a codec invariant
    Validation,
}

/// Error types that can occur in geolayers operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A primitive or payload read ran past the end of the data
    #[error("Truncated read: needed {needed} bytes")]
    TruncatedRead { needed: usize },

    /// Invalid byte order marker (not II or MM)
    #[error("Invalid byte order: 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// Invalid TIFF magic number
    #[error("Invalid TIFF magic number: {0}")]
    InvalidMagic(u16),

    /// Bit depth other than 8 bits per sample
    #[error("Unsupported bits per sample: {0} (only 8-bit samples are supported)")]
    UnsupportedBitDepth(u32),

    /// Invalid TIFF format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Missing required tag
    #[error("Missing required tag: {0}")]
    MissingTag(u16),

    /// Concatenated strips do not hold exactly width * height * samples bytes
    #[error("Strip size mismatch: expected {expected} bytes, got {actual}")]
    StripSizeMismatch { expected: u64, actual: u64 },

    /// The ImageDescription carries no usable DATUM token
    #[error("Missing or invalid DATUM in image description")]
    MissingDatum,

    /// The directory chain held no directory
    #[error("No valid directories found")]
    NoDirectories,

    /// A collection without layers was passed to the writer
    #[error("Cannot write an empty raster collection")]
    EmptyCollection,

    /// Two property keys map to the same custom tag
    #[error("Property key '{key}' collides with '{existing}' on tag {tag}")]
    PropertyCollision {
        key: String,
        existing: String,
        tag: u16,
    },

    /// A coordinate conversion failed
    #[error("Projection error: {0}")]
    Projection(#[from] proj4rs::errors::Error),

    /// Any other violated invariant
    #[error("Invalid value: {0}")]
    Invalid(String),
}

impl Error {
    /// Maps an `io::Error` raised by a `read_exact` of `needed` bytes
    pub(crate) fn from_read(error: io::Error, needed: usize) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Error::TruncatedRead { needed }
        } else {
            Error::Io(error)
        }
    }

    /// Returns the failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::TruncatedRead { .. } => ErrorKind::TruncatedRead,
            Error::InvalidByteOrder(_)
            | Error::InvalidMagic(_)
            | Error::UnsupportedBitDepth(_)
            | Error::InvalidFormat(_) => ErrorKind::Format,
            Error::MissingTag(_)
            | Error::StripSizeMismatch { .. }
            | Error::MissingDatum
            | Error::NoDirectories
            | Error::EmptyCollection
            | Error::PropertyCollision { .. }
            | Error::Projection(_)
            | Error::Invalid(_) => ErrorKind::Validation,
        }
    }
}
