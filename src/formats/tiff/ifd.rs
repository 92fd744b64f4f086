//! Image File Directory (IFD) structures

use std::collections::BTreeMap;
use crate::error::{Error, Result};
use crate::io::byte_order::ByteOrderHandler;
use super::tags;

/// Size in bytes of the value/offset field of a classic TIFF entry
pub const INLINE_CAPACITY: usize = 4;

/// Size in bytes of one serialized directory entry
pub const ENTRY_SIZE: u32 = 12;

/// Bytes a directory of `entry_count` entries occupies on disk: the entry
/// count, the entries and the trailing next-directory offset
pub fn directory_size(entry_count: u16) -> u32 {
    2 + entry_count as u32 * ENTRY_SIZE + 4
}

/// Where an entry's payload lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryValue<'a> {
    /// Payload packed into the entry itself, already trimmed to its length
    Inline(&'a [u8]),
    /// Payload stored elsewhere in the file
    AtOffset { offset: u32, len: usize },
}

/// Represents an Image File Directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u32,
    /// Value-or-offset field exactly as it appeared in the file
    pub raw_value: [u8; 4],
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u32, raw_value: [u8; 4]) -> Self {
        Self {
            tag,
            field_type,
            count,
            raw_value,
        }
    }

    /// Returns the size in bytes of this field type
    pub fn field_type_size(&self) -> usize {
        tags::field_type_size(self.field_type)
    }

    /// Total payload size in bytes
    pub fn byte_len(&self) -> u64 {
        self.field_type_size() as u64 * self.count as u64
    }

    /// Returns whether the value is stored inline (in the value field)
    pub fn is_inline(&self) -> bool {
        self.byte_len() <= INLINE_CAPACITY as u64
    }

    /// Resolves the value field into inline bytes or an offset/length pair
    pub fn value(&self, handler: &dyn ByteOrderHandler) -> Result<EntryValue<'_>> {
        let len = usize::try_from(self.byte_len()).map_err(|_| {
            Error::InvalidFormat(format!("tag {} payload of {} bytes is too large", self.tag, self.byte_len()))
        })?;

        if self.is_inline() {
            Ok(EntryValue::Inline(&self.raw_value[..len]))
        } else {
            Ok(EntryValue::AtOffset {
                offset: handler.decode_u32(self.raw_value),
                len,
            })
        }
    }
}

/// Represents an Image File Directory
///
/// Entries are kept in a map ordered by tag. A tag that appears twice in
/// one directory is not an error: the later entry replaces the earlier.
#[derive(Debug, Clone)]
pub struct IFD {
    /// IFD number (0-based position in the chain)
    pub number: usize,
    /// Offset to this IFD in file
    pub offset: u32,
    /// Offset of the following IFD, 0 at the end of the chain
    pub next_offset: u32,
    entries: BTreeMap<u16, IFDEntry>,
}

impl IFD {
    /// Creates a new IFD
    pub fn new(number: usize, offset: u32) -> Self {
        Self {
            number,
            offset,
            next_offset: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Adds an entry, returning the entry it shadows if the tag was present
    pub fn add_entry(&mut self, entry: IFDEntry) -> Option<IFDEntry> {
        self.entries.insert(entry.tag, entry)
    }

    /// Gets an entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.entries.get(&tag)
    }

    /// Entries in ascending tag order
    pub fn entries(&self) -> impl Iterator<Item = &IFDEntry> {
        self.entries.values()
    }

    /// Entries whose tag is at or above `floor`, ascending
    pub fn custom_entries(&self, floor: u16) -> impl Iterator<Item = &IFDEntry> {
        self.entries.range(floor..).map(|(_, entry)| entry)
    }

    /// Returns number of distinct tags
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Checks if this IFD has GeoTIFF tags
    pub fn is_geotiff(&self) -> bool {
        [tags::MODEL_PIXEL_SCALE, tags::MODEL_TIEPOINT, tags::GEO_KEY_DIRECTORY]
            .iter()
            .any(|tag| self.entries.contains_key(tag))
    }
}
