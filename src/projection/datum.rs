use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::projection::coordinate::Coordinate;

/// WGS84 longitude/latitude in radians, ellipsoidal height in meters
const WGS84_GEODETIC: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// WGS84 earth-centered, earth-fixed cartesian frame in meters
const WGS84_GEOCENTRIC: &str = "+proj=geocent +ellps=WGS84 +datum=WGS84 +units=m +no_defs";

/// Reference point of a local frame: geodetic latitude/longitude in degrees
/// and ellipsoidal altitude in meters on WGS84
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Datum {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl Datum {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    /// Whether the datum can anchor a local frame
    ///
    /// The all-zero datum is the "unset" value.
    pub fn is_set(&self) -> bool {
        let finite = self.lat.is_finite() && self.lon.is_finite() && self.alt.is_finite();
        finite && !(self.lat == 0.0 && self.lon == 0.0 && self.alt == 0.0)
    }

    /// Converts a point of this datum's local east/north/up frame (meters)
    /// to WGS84 longitude (x), latitude (y) and altitude (z)
    ///
    /// The datum is lifted into the geocentric frame, the local offset is
    /// rotated onto the geocentric axes there, and the sum is projected
    /// back to geodetic coordinates.
    pub fn enu_to_wgs(&self, enu: Coordinate) -> Result<Coordinate> {
        if !self.is_set() {
            return Err(Error::Invalid(format!(
                "datum ({}, {}, {}) is not set",
                self.lat, self.lon, self.alt
            )));
        }
        if !enu.is_finite() {
            return Err(Error::Invalid("local shift is not finite".to_string()));
        }

        let geodetic = Proj::from_proj_string(WGS84_GEODETIC)?;
        let geocentric = Proj::from_proj_string(WGS84_GEOCENTRIC)?;

        let mut origin = (self.lon.to_radians(), self.lat.to_radians(), self.alt);
        transform(&geodetic, &geocentric, &mut origin)?;

        let (dx, dy, dz) = self.enu_to_ecef_offset(enu);
        let mut point = (origin.0 + dx, origin.1 + dy, origin.2 + dz);
        transform(&geocentric, &geodetic, &mut point)?;

        Ok(Coordinate::from_lonlat_alt(
            point.0.to_degrees(),
            point.1.to_degrees(),
            point.2,
        ))
    }

    /// Rotates a local east/north/up offset onto the geocentric axes
    fn enu_to_ecef_offset(&self, enu: Coordinate) -> (f64, f64, f64) {
        let (sin_lat, cos_lat) = self.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.lon.to_radians().sin_cos();

        (
            -sin_lon * enu.x - sin_lat * cos_lon * enu.y + cos_lat * cos_lon * enu.z,
            cos_lon * enu.x - sin_lat * sin_lon * enu.y + cos_lat * sin_lon * enu.z,
            cos_lat * enu.y + sin_lat * enu.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_set() {
        assert!(!Datum::default().is_set());
        assert!(Datum::new(47.5, 8.5, 200.0).is_set());
        assert!(Datum::new(0.0, 0.0, 1.0).is_set());
        assert!(!Datum::new(f64::NAN, 8.5, 0.0).is_set());
    }

    #[test]
    fn test_origin_maps_to_datum() {
        let datum = Datum::new(47.5, 8.5, 200.0);
        let wgs = datum.enu_to_wgs(Coordinate::default()).unwrap();
        assert!((wgs.y - 47.5).abs() < 1e-8);
        assert!((wgs.x - 8.5).abs() < 1e-8);
        assert!((wgs.z - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_north_and_east_offsets() {
        let datum = Datum::new(47.5, 8.5, 200.0);

        let north = datum.enu_to_wgs(Coordinate::new_3d(0.0, 1000.0, 0.0)).unwrap();
        assert!(north.y > 47.5);
        assert!((north.y - 47.5 - 0.008_99).abs() < 1e-4);
        assert!((north.x - 8.5).abs() < 1e-8);

        let east = datum.enu_to_wgs(Coordinate::new_3d(1000.0, 0.0, 0.0)).unwrap();
        assert!(east.x > 8.5);
        assert!((east.y - 47.5).abs() < 1e-3);
    }

    #[test]
    fn test_up_offset_changes_altitude() {
        let datum = Datum::new(-33.9, 151.2, 10.0);
        let up = datum.enu_to_wgs(Coordinate::new_3d(0.0, 0.0, 50.0)).unwrap();
        assert!((up.z - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_keeps_offset_length() {
        let datum = Datum::new(-33.9, 151.2, 10.0);
        let (dx, dy, dz) = datum.enu_to_ecef_offset(Coordinate::new_3d(3.0, 4.0, 12.0));
        assert!(((dx * dx + dy * dy + dz * dz).sqrt() - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_unset_datum_is_rejected() {
        assert!(Datum::default().enu_to_wgs(Coordinate::default()).is_err());
    }
}
