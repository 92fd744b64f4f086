//! Strip packing and unpacking
//!
//! A layer's pixels travel as one uncompressed strip of 8-bit samples.
//! Grids hold a single sample per pixel; wider layouts are produced by
//! replication on write and reduced to their first sample (or first
//! plane) on read.

use crate::error::{Error, Result};
use crate::projection::Grid;
use super::tags::{PLANAR_CHUNKY, PLANAR_SEPARATE};

/// Flattens a grid into a row-major chunky byte run, repeating every
/// sample `samples_per_pixel` times
pub fn flatten(grid: &Grid<u8>, samples_per_pixel: u32) -> Vec<u8> {
    let spp = samples_per_pixel.max(1) as usize;
    if spp == 1 {
        return grid.as_slice().to_vec();
    }

    let mut bytes = Vec::with_capacity(grid.len() * spp);
    for &sample in grid.iter() {
        bytes.extend(std::iter::repeat(sample).take(spp));
    }
    bytes
}

/// Rebuilds a `height x width` grid from a strip payload
///
/// The payload must hold exactly `width * height * samples_per_pixel`
/// bytes. Chunky payloads keep the first sample of every pixel; planar
/// payloads keep the first plane.
pub fn unflatten(
    bytes: &[u8],
    width: u32,
    height: u32,
    samples_per_pixel: u32,
    planar_config: u32,
) -> Result<Grid<u8>> {
    let pixels = width as u64 * height as u64;
    let expected = pixels * samples_per_pixel.max(1) as u64;
    if bytes.len() as u64 != expected {
        return Err(Error::StripSizeMismatch {
            expected,
            actual: bytes.len() as u64,
        });
    }

    let (rows, cols) = (height as usize, width as usize);
    let spp = samples_per_pixel.max(1) as usize;

    let samples = match planar_config {
        PLANAR_CHUNKY if spp == 1 => bytes.to_vec(),
        PLANAR_CHUNKY => bytes.iter().step_by(spp).copied().collect(),
        PLANAR_SEPARATE => bytes[..rows * cols].to_vec(),
        other => {
            return Err(Error::InvalidFormat(format!(
                "unsupported planar configuration {}",
                other
            )))
        }
    };

    Grid::from_vec(rows, cols, samples)
}
