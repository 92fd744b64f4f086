//! Reader and writer options
//!
//! Both option sets deserialize with `serde`, every field falling back to
//! its default, so an embedding application can keep them in its own
//! configuration files.

use serde::{Deserialize, Serialize};
use crate::io::ByteOrder;

// =============================================================================
// Default Values
// =============================================================================

/// Lowest tag number treated as a custom (vendor) tag.
pub const DEFAULT_CUSTOM_TAG_FLOOR: u16 = 50000;

/// Maximum number of directories followed before a chain is rejected.
pub const DEFAULT_MAX_DIRECTORIES: usize = 1000;

// =============================================================================
// Options
// =============================================================================

/// Options for parsing a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Memory-map files instead of reading them through a buffered handle
    pub use_mmap: bool,

    /// Upper bound on the length of the directory chain
    pub max_directories: usize,

    /// Tags at or above this number are collected as custom tags
    pub custom_tag_floor: u16,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            use_mmap: true,
            max_directories: DEFAULT_MAX_DIRECTORIES,
            custom_tag_floor: DEFAULT_CUSTOM_TAG_FLOOR,
        }
    }
}

/// Options for building a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Byte order of every multi-byte value in the output
    pub byte_order: ByteOrder,

    /// Custom tags below this number are rejected
    pub custom_tag_floor: u16,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::LittleEndian,
            custom_tag_floor: DEFAULT_CUSTOM_TAG_FLOOR,
        }
    }
}
