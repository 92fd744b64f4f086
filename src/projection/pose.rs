//! Local-frame placement of a raster layer

use serde::{Deserialize, Serialize};
use super::coordinate::Coordinate;

/// Orientation as roll/pitch/yaw in degrees
///
/// The container only persists yaw (the heading); roll and pitch are kept
/// for callers that carry a full attitude around.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Euler {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Heading-only orientation
    pub fn from_yaw(yaw: f64) -> Self {
        Self::new(0.0, 0.0, yaw)
    }
}

/// Position in the datum's local ENU frame plus orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub point: Coordinate,
    pub angle: Euler,
}

impl Pose {
    pub fn new(point: Coordinate, angle: Euler) -> Self {
        Self { point, angle }
    }

    /// A pose at the datum origin with the given heading
    pub fn from_heading(yaw: f64) -> Self {
        Self::new(Coordinate::default(), Euler::from_yaw(yaw))
    }
}
