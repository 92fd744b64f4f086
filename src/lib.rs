//! geolayers - layered GeoTIFF containers for Rust
//!
//! geolayers reads and writes TIFF files holding one or more 8-bit raster
//! layers, each anchored to a geodetic datum with a local shift, a pixel
//! resolution and arbitrary numeric or string custom tags.
//!
//! # Examples
//!
//! ## Building a file
//!
//! ```no_run
//! use geolayers::{Datum, Grid, Layer, RasterCollection};
//!
//! let mut grid = Grid::new(4, 6);
//! grid[(1, 1)] = 2u8;
//!
//! let mut rc = RasterCollection::new(Datum::new(47.5, 8.5, 200.0), 1.5);
//! let mut layer = Layer::new(grid);
//! layer.name = "terrain".to_string();
//! rc.push(layer);
//! rc.set_global_property("survey", "2024-06")?;
//!
//! geolayers::write(&rc, "layers.tif")?;
//! # Ok::<(), geolayers::Error>(())
//! ```
//!
//! ## Reading it back
//!
//! ```no_run
//! let rc = geolayers::parse("layers.tif")?;
//! println!("{}", rc);
//!
//! for layer in rc.iter() {
//!     println!("{} x {}: {:?}", layer.width(), layer.height(), layer.properties());
//! }
//! # Ok::<(), geolayers::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod config;
pub mod types;
pub mod formats;
pub mod projection;

use std::path::Path;

pub use error::{Error, ErrorKind, Result};
pub use config::{ReadOptions, WriteOptions};
pub use types::{Crs, Dimensions};
pub use formats::tiff::{
    Layer, RasterCollection, TiffReader, TiffWriter, IFD, IFDEntry,
    tags, TIFF_MAGIC
};
pub use io::{ByteOrder, SeekableReader};
pub use projection::{Coordinate, Datum, Euler, Grid, Pose};

/// Parses a file with default options
pub fn parse<P: AsRef<Path>>(path: P) -> Result<RasterCollection> {
    TiffReader::open(path)?.read()
}

/// Parses a file with custom options
pub fn parse_with<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<RasterCollection> {
    TiffReader::open_with_options(path, options)?.read()
}

/// Parses an in-memory file
pub fn parse_bytes(bytes: Vec<u8>) -> Result<RasterCollection> {
    TiffReader::from_bytes(bytes)?.read()
}

/// Builds a little-endian file in memory
pub fn build(collection: &RasterCollection) -> Result<Vec<u8>> {
    TiffWriter::default().build(collection)
}

/// Builds a file in memory with custom options
pub fn build_with(collection: &RasterCollection, options: &WriteOptions) -> Result<Vec<u8>> {
    TiffWriter::new(options.clone()).build(collection)
}

/// Builds a file and writes it to `path`
pub fn write<P: AsRef<Path>>(collection: &RasterCollection, path: P) -> Result<()> {
    TiffWriter::default().write(collection, path)
}
