//! Raster collection data structures

use std::collections::BTreeMap;
use std::fmt;
use crate::error::Result;
use crate::projection::{Datum, Grid, Pose};
use crate::types::{Crs, Dimensions};
use super::geotiff::{GeoKeyDirectory, TiePoint, DEFAULT_RESOLUTION};
use super::properties::{self, CustomTags};
use super::tags::PLANAR_CHUNKY;

/// One raster plane, stored as one directory of the chain
///
/// The geospatial fields are optional on layers built in code: an unset
/// field is taken from the owning [`RasterCollection`] when writing.
/// Layers produced by the reader have all of them filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Samples, `height` rows by `width` columns
    pub grid: Grid<u8>,
    pub samples_per_pixel: u32,
    /// 1 = chunky, 2 = planar
    pub planar_config: u32,

    pub crs: Option<Crs>,
    pub datum: Option<Datum>,
    /// Position and heading in the datum's local frame
    pub shift: Option<Pose>,
    /// Map units per pixel
    pub resolution: Option<f64>,

    /// Raw ImageDescription. On write its keyword groups only fill fields
    /// left unset here; its free text is carried after the composed groups.
    pub image_description: String,
    /// Single word, empty for none
    pub name: String,
    /// Single word, empty for none
    pub layer_type: String,

    /// Tags at or above the custom floor
    pub custom_tags: CustomTags,

    /// Where the layer's directory was found (read only)
    pub ifd_offset: u32,
    pub strip_offsets: Vec<u32>,
    pub strip_byte_counts: Vec<u32>,
    pub geo_keys: Option<GeoKeyDirectory>,
    pub tiepoints: Vec<TiePoint>,
}

impl Layer {
    /// Creates a single-sample chunky layer around a grid
    pub fn new(grid: Grid<u8>) -> Self {
        Self {
            grid,
            samples_per_pixel: 1,
            planar_config: PLANAR_CHUNKY,
            crs: None,
            datum: None,
            shift: None,
            resolution: None,
            image_description: String::new(),
            name: String::new(),
            layer_type: String::new(),
            custom_tags: CustomTags::new(),
            ifd_offset: 0,
            strip_offsets: Vec::new(),
            strip_byte_counts: Vec::new(),
            geo_keys: None,
            tiepoints: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.grid.cols() as u32
    }

    pub fn height(&self) -> u32 {
        self.grid.rows() as u32
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// Stores a string property under its derived custom tag
    pub fn set_property(&mut self, key: &str, value: &str) -> Result<()> {
        properties::set(&mut self.custom_tags, key, value).map(|_| ())
    }

    pub fn property(&self, key: &str) -> Option<String> {
        properties::get(&self.custom_tags, key)
    }

    pub fn properties(&self) -> BTreeMap<String, String> {
        properties::all(&self.custom_tags)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        properties::remove(&mut self.custom_tags, key)
    }
}

/// Ordered layers plus the metadata they default to
#[derive(Debug, Clone, PartialEq)]
pub struct RasterCollection {
    /// One layer per directory, in chain order
    pub layers: Vec<Layer>,
    pub crs: Crs,
    pub datum: Datum,
    pub shift: Pose,
    pub resolution: f64,
}

impl Default for RasterCollection {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            crs: Crs::default(),
            datum: Datum::default(),
            shift: Pose::default(),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl RasterCollection {
    /// Creates an empty collection anchored at `datum`
    pub fn new(datum: Datum, resolution: f64) -> Self {
        Self {
            datum,
            resolution,
            ..Self::default()
        }
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    /// Sets a property on every layer
    ///
    /// Either every layer accepts the key or none is modified.
    pub fn set_global_property(&mut self, key: &str, value: &str) -> Result<()> {
        let updated = self
            .layers
            .iter()
            .map(|layer| {
                let mut tags = layer.custom_tags.clone();
                properties::set(&mut tags, key, value).map(|_| tags)
            })
            .collect::<Result<Vec<_>>>()?;

        for (layer, tags) in self.layers.iter_mut().zip(updated) {
            layer.custom_tags = tags;
        }
        Ok(())
    }

    /// Reads a property from the first layer
    pub fn global_property(&self, key: &str) -> Option<String> {
        self.layers.first()?.property(key)
    }

    pub fn global_properties(&self) -> BTreeMap<String, String> {
        self.layers
            .first()
            .map(Layer::properties)
            .unwrap_or_default()
    }

    /// Removes a property from every layer, returning the first layer's value
    pub fn remove_global_property(&mut self, key: &str) -> Option<String> {
        let mut first = None;
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let value = layer.remove_property(key);
            if i == 0 {
                first = value;
            }
        }
        first
    }
}

impl fmt::Display for RasterCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Raster Collection:")?;
        writeln!(f, "  CRS: {}", self.crs)?;
        writeln!(
            f,
            "  Datum: lat={} lon={} alt={}",
            self.datum.lat, self.datum.lon, self.datum.alt
        )?;
        writeln!(
            f,
            "  Shift: x={} y={} z={} yaw={}",
            self.shift.point.x, self.shift.point.y, self.shift.point.z, self.shift.angle.yaw
        )?;
        writeln!(f, "  Resolution: {}", self.resolution)?;
        writeln!(f, "  Layers: {}", self.layers.len())?;

        for (i, layer) in self.layers.iter().enumerate() {
            write!(
                f,
                "    [{}] IFD@{} {}x{} SPP={} Planar={}",
                i,
                layer.ifd_offset,
                layer.width(),
                layer.height(),
                layer.samples_per_pixel,
                layer.planar_config
            )?;
            if !layer.name.is_empty() {
                write!(f, " Name={}", layer.name)?;
            }
            if !layer.custom_tags.is_empty() {
                write!(f, " CustomTags={}", layer.custom_tags.len())?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(rows: usize, cols: usize) -> Layer {
        Layer::new(Grid::new(rows, cols))
    }

    #[test]
    fn test_layer_defaults() {
        let layer = layer(4, 6);
        assert_eq!(layer.width(), 6);
        assert_eq!(layer.height(), 4);
        assert_eq!(layer.samples_per_pixel, 1);
        assert_eq!(layer.planar_config, 1);
        assert!(layer.datum.is_none());
    }

    #[test]
    fn test_collection_defaults() {
        let rc = RasterCollection::default();
        assert!(rc.is_empty());
        assert_eq!(rc.resolution, 1.0);
        assert_eq!(rc.crs, Crs::Wgs);
    }

    #[test]
    fn test_global_properties_apply_to_every_layer() {
        let mut rc = RasterCollection::new(Datum::new(1.0, 2.0, 3.0), 0.5);
        rc.push(layer(1, 1));
        rc.push(layer(2, 2));

        rc.set_global_property("survey", "2024-06").unwrap();
        for layer in rc.iter() {
            assert_eq!(layer.property("survey").as_deref(), Some("2024-06"));
        }
        assert_eq!(rc.global_property("survey").as_deref(), Some("2024-06"));
        assert_eq!(rc.global_properties().len(), 1);

        assert_eq!(rc.remove_global_property("survey").as_deref(), Some("2024-06"));
        assert!(rc.iter().all(|layer| layer.properties().is_empty()));
    }

    #[test]
    fn test_global_property_is_all_or_nothing() {
        let mut rc = RasterCollection::default();
        rc.push(layer(1, 1));
        let mut blocked = layer(1, 1);
        let tag = properties::property_tag("owner");
        blocked.custom_tags.insert(tag, properties::encode("other=x"));
        rc.push(blocked);

        assert!(rc.set_global_property("owner", "me").is_err());
        assert!(rc.layers[0].custom_tags.is_empty());
    }

    #[test]
    fn test_display() {
        let mut rc = RasterCollection::new(Datum::new(47.5, 8.5, 200.0), 1.5);
        let mut l = layer(4, 6);
        l.name = "dem".to_string();
        rc.push(l);

        let text = rc.to_string();
        assert!(text.contains("Datum: lat=47.5 lon=8.5 alt=200"));
        assert!(text.contains("Resolution: 1.5"));
        assert!(text.contains("[0] IFD@0 6x4 SPP=1 Planar=1 Name=dem"));
    }
}
