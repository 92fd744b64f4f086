//! Layered GeoTIFF container support

pub mod tags;
pub mod ifd;
pub mod types;
pub mod strips;
pub mod description;
pub mod geotiff;
pub mod properties;
pub mod reader;
pub mod writer;

pub use ifd::{EntryValue, IFD, IFDEntry};
pub use types::{Layer, RasterCollection};
pub use reader::TiffReader;
pub use writer::TiffWriter;
pub use description::Description;
pub use geotiff::{GeoKeyDirectory, TiePoint};

/// TIFF magic number (42)
pub const TIFF_MAGIC: u16 = 42;
