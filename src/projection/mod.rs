//! Geospatial primitives the container format refers to
//!
//! Datums anchor a layer's local east/north/up frame on the WGS84
//! ellipsoid, poses place a layer within that frame and grids hold the
//! decoded samples.

pub mod coordinate;
pub mod datum;
pub mod grid;
pub mod pose;

pub use coordinate::Coordinate;
pub use datum::Datum;
pub use grid::Grid;
pub use pose::{Euler, Pose};
