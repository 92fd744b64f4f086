//! Core data types for geolayers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference a layer's grid is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic WGS84
    #[default]
    Wgs,
    /// Local east/north/up frame around the datum
    Enu,
}

impl Crs {
    /// Parses the name used in the image description
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "WGS" | "WGS84" | "EPSG:4326" => Some(Crs::Wgs),
            "ENU" => Some(Crs::Enu),
            _ => None,
        }
    }

    /// Returns the name written to the image description
    pub fn name(&self) -> &'static str {
        match self {
            Crs::Wgs => "WGS84",
            Crs::Enu => "ENU",
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Creates new dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the total number of pixels
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Number of bytes an 8-bit image with `samples_per_pixel` samples needs
    pub fn sample_bytes(&self, samples_per_pixel: u32) -> u64 {
        self.pixel_count().saturating_mul(samples_per_pixel as u64)
    }
}
