//! Byte layout of a container
//!
//! ```text
//! header | strip 0 .. strip N-1 | IFD 0 .. IFD N-1 | layer 0 payloads .. layer N-1 payloads
//! ```
//!
//! Each layer's payloads follow in a fixed order: description, pixel
//! scale, GeoKey directory, tiepoint, then custom tags too long to sit
//! inline in ascending tag order. Every address is known before the
//! first byte is written.

use std::collections::BTreeMap;
use crate::error::{Error, Result};
use crate::formats::tiff::ifd::{directory_size, INLINE_CAPACITY};

/// Byte order marker, magic number and first IFD offset
pub const HEADER_SIZE: u64 = 8;

/// Entries every directory carries besides its custom tags
pub const FIXED_ENTRY_COUNT: usize = 14;

/// ModelPixelScale: three doubles
pub const PIXEL_SCALE_SIZE: u64 = 3 * 8;

/// GeoKey directory: header plus four keys, 20 shorts
pub const GEO_KEY_SIZE: u64 = 20 * 2;

/// ModelTiepoint: six doubles
pub const TIEPOINT_SIZE: u64 = 6 * 8;

/// Payload sizes of one layer, the planner's input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSizes {
    /// Flattened strip length
    pub strip_len: u64,
    /// Description length including its NUL
    pub description_len: u64,
    /// `(tag, value count)` of every custom tag, ascending by tag
    pub custom_counts: Vec<(u16, u32)>,
}

/// Where everything of one layer goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerPlan {
    pub strip_offset: u32,
    pub strip_len: u32,
    pub ifd_offset: u32,
    /// Following directory, 0 for the last
    pub next_ifd_offset: u32,
    pub entry_count: u16,
    /// `None` when the description fits inline
    pub description_offset: Option<u32>,
    pub scale_offset: u32,
    pub geo_key_offset: u32,
    pub tiepoint_offset: u32,
    /// Custom tags whose values do not fit inline
    pub custom_offsets: BTreeMap<u16, u32>,
}

/// Complete layout of a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    pub layers: Vec<LayerPlan>,
    pub total_size: u32,
}

impl LayoutPlan {
    /// Assigns addresses to every strip, directory and payload
    pub fn compute(sizes: &[LayerSizes]) -> Result<Self> {
        let mut layers: Vec<LayerPlan> = Vec::with_capacity(sizes.len());
        let mut cursor = HEADER_SIZE;

        for size in sizes {
            layers.push(LayerPlan {
                strip_offset: offset(cursor)?,
                strip_len: offset(size.strip_len)?,
                ..LayerPlan::default()
            });
            cursor += size.strip_len;
        }

        for (plan, size) in layers.iter_mut().zip(sizes) {
            let entries = FIXED_ENTRY_COUNT + size.custom_counts.len();
            plan.entry_count = u16::try_from(entries)
                .map_err(|_| Error::Invalid(format!("{} tags do not fit one directory", entries)))?;
            plan.ifd_offset = offset(cursor)?;
            cursor += directory_size(plan.entry_count) as u64;
        }

        for i in 1..layers.len() {
            layers[i - 1].next_ifd_offset = layers[i].ifd_offset;
        }

        for (plan, size) in layers.iter_mut().zip(sizes) {
            if size.description_len > INLINE_CAPACITY as u64 {
                plan.description_offset = Some(offset(cursor)?);
                cursor += size.description_len;
            }

            plan.scale_offset = offset(cursor)?;
            cursor += PIXEL_SCALE_SIZE;
            plan.geo_key_offset = offset(cursor)?;
            cursor += GEO_KEY_SIZE;
            plan.tiepoint_offset = offset(cursor)?;
            cursor += TIEPOINT_SIZE;

            for &(tag, count) in &size.custom_counts {
                let len = count as u64 * 4;
                if len > INLINE_CAPACITY as u64 {
                    plan.custom_offsets.insert(tag, offset(cursor)?);
                    cursor += len;
                }
            }
        }

        Ok(Self {
            layers,
            total_size: offset(cursor)?,
        })
    }
}

fn offset(position: u64) -> Result<u32> {
    u32::try_from(position)
        .map_err(|_| Error::Invalid(format!("file exceeds 4 GiB (offset {})", position)))
}
