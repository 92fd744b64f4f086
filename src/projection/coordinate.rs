use serde::{Deserialize, Serialize};

/// Represents a coordinate in any coordinate reference system
///
/// For geographic coordinates `x` is longitude, `y` latitude (degrees) and
/// `z` altitude (meters); in a local ENU frame they are east, north and up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    /// Creates a new 2D coordinate (z = 0.0)
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Creates a new 3D coordinate
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a 3D coordinate from longitude/latitude/altitude
    pub fn from_lonlat_alt(lon: f64, lat: f64, alt: f64) -> Self {
        Self::new_3d(lon, lat, alt)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}
