//! GeoTIFF specific functionality
//!
//! Three numeric tags tie a layer to the world: the GeoKey directory
//! asserting the geographic reference, ModelPixelScale carrying the
//! resolution and ModelTiepoint anchoring the raster centre.

use crate::error::{Error, Result};
use crate::projection::{Datum, Pose};

/// GeoKey constants
pub mod geo_keys {
    pub const GT_MODEL_TYPE: u16 = 1024;
    pub const GT_RASTER_TYPE: u16 = 1025;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const GEOG_ANGULAR_UNITS: u16 = 2054;
    pub const PROJECTED_CS_TYPE: u16 = 3072;

    pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
    pub const RASTER_PIXEL_IS_AREA: u16 = 1;
    pub const EPSG_WGS84: u16 = 4326;
    pub const ANGULAR_DEGREE: u16 = 9102;
}

/// One GeoKey record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKey {
    pub key_id: u16,
    /// 0 when `value` holds the value itself
    pub location: u16,
    pub count: u16,
    pub value: u16,
}

impl GeoKey {
    pub fn new(key_id: u16, value: u16) -> Self {
        Self {
            key_id,
            location: 0,
            count: 1,
            value,
        }
    }
}

/// Decoded GeoKeyDirectoryTag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoKeyDirectory {
    pub version: u16,
    pub revision: u16,
    pub minor_revision: u16,
    pub keys: Vec<GeoKey>,
}

impl GeoKeyDirectory {
    /// The directory every layer is written with: geographic WGS84 in
    /// degrees, pixels as areas
    pub fn wgs84() -> Self {
        Self {
            version: 1,
            revision: 1,
            minor_revision: 0,
            keys: vec![
                GeoKey::new(geo_keys::GT_MODEL_TYPE, geo_keys::MODEL_TYPE_GEOGRAPHIC),
                GeoKey::new(geo_keys::GT_RASTER_TYPE, geo_keys::RASTER_PIXEL_IS_AREA),
                GeoKey::new(geo_keys::GEOGRAPHIC_TYPE, geo_keys::EPSG_WGS84),
                GeoKey::new(geo_keys::GEOG_ANGULAR_UNITS, geo_keys::ANGULAR_DEGREE),
            ],
        }
    }

    /// Number of SHORT values in the serialized block
    pub fn short_count(&self) -> usize {
        4 + self.keys.len() * 4
    }

    pub fn to_shorts(&self) -> Vec<u16> {
        let mut shorts = Vec::with_capacity(self.short_count());
        shorts.extend_from_slice(&[
            self.version,
            self.revision,
            self.minor_revision,
            self.keys.len() as u16,
        ]);
        for key in &self.keys {
            shorts.extend_from_slice(&[key.key_id, key.location, key.count, key.value]);
        }
        shorts
    }

    /// Decodes a block, rejecting one whose header promises more keys than
    /// it holds
    pub fn from_shorts(shorts: &[u16]) -> Result<Self> {
        if shorts.len() < 4 {
            return Err(Error::InvalidFormat(format!(
                "GeoKey directory of {} values has no header",
                shorts.len()
            )));
        }

        let num_keys = shorts[3] as usize;
        let needed = 4 + num_keys * 4;
        if needed > shorts.len() {
            return Err(Error::InvalidFormat(format!(
                "GeoKey directory declares {} keys but holds only {} values",
                num_keys,
                shorts.len()
            )));
        }

        let keys = shorts[4..needed]
            .chunks_exact(4)
            .map(|k| GeoKey {
                key_id: k[0],
                location: k[1],
                count: k[2],
                value: k[3],
            })
            .collect();

        Ok(Self {
            version: shorts[0],
            revision: shorts[1],
            minor_revision: shorts[2],
            keys,
        })
    }

    pub fn get(&self, key_id: u16) -> Option<&GeoKey> {
        self.keys.iter().find(|k| k.key_id == key_id)
    }

    /// EPSG code of the geographic or projected system, if declared inline
    pub fn epsg_code(&self) -> Option<u16> {
        [geo_keys::GEOGRAPHIC_TYPE, geo_keys::PROJECTED_CS_TYPE]
            .iter()
            .filter_map(|id| self.get(*id))
            .find(|k| k.location == 0)
            .map(|k| k.value)
    }
}

/// Represents a GeoTIFF tiepoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiePoint {
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub pixel_z: f64,
    pub geo_x: f64,
    pub geo_y: f64,
    pub geo_z: f64,
}

impl TiePoint {
    /// Anchors the centre pixel of a `width x height` raster at the WGS84
    /// position of `shift` in the datum's local frame
    pub fn centre(width: u32, height: u32, datum: &Datum, shift: &Pose) -> Result<Self> {
        let world = datum.enu_to_wgs(shift.point)?;
        Ok(Self {
            pixel_x: width as f64 / 2.0,
            pixel_y: height as f64 / 2.0,
            pixel_z: 0.0,
            geo_x: world.x,
            geo_y: world.y,
            geo_z: world.z,
        })
    }

    pub fn to_doubles(&self) -> [f64; 6] {
        [
            self.pixel_x,
            self.pixel_y,
            self.pixel_z,
            self.geo_x,
            self.geo_y,
            self.geo_z,
        ]
    }

    /// Decodes every 6-value group of a ModelTiepoint payload
    pub fn from_doubles(values: &[f64]) -> Result<Vec<Self>> {
        if values.len() % 6 != 0 {
            return Err(Error::InvalidFormat(format!(
                "ModelTiepoint holds {} values, not a multiple of 6",
                values.len()
            )));
        }
        Ok(values
            .chunks_exact(6)
            .map(|c| TiePoint {
                pixel_x: c[0],
                pixel_y: c[1],
                pixel_z: c[2],
                geo_x: c[3],
                geo_y: c[4],
                geo_z: c[5],
            })
            .collect())
    }
}

/// Resolution used when a layer has no ModelPixelScale
pub const DEFAULT_RESOLUTION: f64 = 1.0;

/// Serialized ModelPixelScale for square pixels
pub fn pixel_scale(resolution: f64) -> [f64; 3] {
    [resolution, resolution, 0.0]
}

/// Reads the X scale of a ModelPixelScale payload
///
/// Fewer than two values leave the default in place; a scale that is not
/// a positive number is rejected.
pub fn resolution_from_scale(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Ok(DEFAULT_RESOLUTION);
    }
    check_resolution(values[0])?;
    Ok(values[0])
}

pub fn check_resolution(resolution: f64) -> Result<()> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(())
    } else {
        Err(Error::Invalid(format!("invalid pixel scale: {}", resolution)))
    }
}
