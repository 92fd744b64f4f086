//! TIFF writer modules
//!
//! Building happens in three phases: every layer is resolved against the
//! collection defaults and flattened (in parallel), the [`LayoutPlan`]
//! assigns all addresses, and finally every byte is written at its
//! planned position.

pub mod layout;

use std::fs;
use std::path::Path;
use log::{debug, info};
use rayon::prelude::*;
use crate::config::WriteOptions;
use crate::error::{Error, Result};
use crate::io::ByteWriter;
use crate::io::byte_order::ByteOrderHandler;
use crate::formats::tiff::{IFD, IFDEntry, Layer, RasterCollection, TIFF_MAGIC};
use crate::formats::tiff::description::Description;
use crate::formats::tiff::geotiff::{self, GeoKeyDirectory, TiePoint};
use crate::formats::tiff::strips;
use crate::formats::tiff::tags::{self, field_types};

pub use self::layout::{LayerPlan, LayerSizes, LayoutPlan};

/// Serializes raster collections
#[derive(Debug, Clone, Default)]
pub struct TiffWriter {
    options: WriteOptions,
}

/// A layer with every collection default applied and every payload encoded
struct PreparedLayer<'a> {
    layer: &'a Layer,
    width: u32,
    height: u32,
    samples_per_pixel: u32,
    resolution: f64,
    description: Vec<u8>,
    tiepoint: TiePoint,
    strip: Vec<u8>,
}

impl TiffWriter {
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Builds the complete file in memory
    pub fn build(&self, collection: &RasterCollection) -> Result<Vec<u8>> {
        if collection.is_empty() {
            return Err(Error::EmptyCollection);
        }

        let prepared = collection
            .layers
            .par_iter()
            .map(|layer| self.prepare(collection, layer))
            .collect::<Result<Vec<_>>>()?;

        let sizes: Vec<LayerSizes> = prepared
            .iter()
            .map(|p| LayerSizes {
                strip_len: p.strip.len() as u64,
                description_len: p.description.len() as u64,
                custom_counts: p
                    .layer
                    .custom_tags
                    .iter()
                    .map(|(&tag, values)| (tag, values.len() as u32))
                    .collect(),
            })
            .collect();
        let plan = LayoutPlan::compute(&sizes)?;

        let handler = self.options.byte_order.handler();
        let directories = prepared
            .par_iter()
            .zip(plan.layers.par_iter())
            .enumerate()
            .map(|(i, (layer, layer_plan))| directory(i, layer, layer_plan, &*handler))
            .collect::<Result<Vec<_>>>()?;

        let mut writer = ByteWriter::new(plan.total_size as usize, self.options.byte_order);
        writer.write_bytes(&self.options.byte_order.tiff_magic())?;
        writer.write_u16(TIFF_MAGIC)?;
        writer.write_u32(plan.layers[0].ifd_offset)?;

        for (layer, layer_plan) in prepared.iter().zip(&plan.layers) {
            writer.seek(layer_plan.strip_offset as usize)?;
            writer.write_bytes(&layer.strip)?;
        }

        for (ifd, layer_plan) in directories.iter().zip(&plan.layers) {
            write_directory(&mut writer, ifd, layer_plan)?;
        }

        for (layer, layer_plan) in prepared.iter().zip(&plan.layers) {
            write_payloads(&mut writer, layer, layer_plan)?;
        }

        info!(
            "Built {} layer(s) into {} bytes, {:?}",
            prepared.len(),
            plan.total_size,
            self.options.byte_order
        );
        Ok(writer.into_inner())
    }

    /// Builds the file and writes it to `path`
    pub fn write<P: AsRef<Path>>(&self, collection: &RasterCollection, path: P) -> Result<()> {
        let bytes = self.build(collection)?;
        fs::write(&path, bytes)?;
        debug!("Wrote {}", path.as_ref().display());
        Ok(())
    }

    /// Resolves a layer's geodata: its own field first, then the groups of
    /// its `image_description`, then the collection default
    fn prepare<'a>(&self, collection: &RasterCollection, layer: &'a Layer) -> Result<PreparedLayer<'a>> {
        let width = u32::try_from(layer.grid.cols())
            .map_err(|_| Error::Invalid(format!("grid width {} exceeds u32", layer.grid.cols())))?;
        let height = u32::try_from(layer.grid.rows())
            .map_err(|_| Error::Invalid(format!("grid height {} exceeds u32", layer.grid.rows())))?;
        if width == 0 || height == 0 {
            return Err(Error::Invalid(format!("layer has zero dimensions {}x{}", width, height)));
        }
        if layer.samples_per_pixel == 0 {
            return Err(Error::Invalid("samples per pixel must be at least 1".to_string()));
        }

        let own = Description::parse(&layer.image_description);
        let crs = layer.crs.or(own.crs).unwrap_or(collection.crs);
        let datum = layer.datum.or(own.datum).unwrap_or(collection.datum);
        let shift = layer.shift.or(own.shift).unwrap_or(collection.shift);
        let resolution = layer.resolution.unwrap_or(collection.resolution);
        geotiff::check_resolution(resolution)?;

        for (&tag, values) in &layer.custom_tags {
            if tag < self.options.custom_tag_floor {
                return Err(Error::Invalid(format!(
                    "custom tag {} is below the custom floor {}",
                    tag, self.options.custom_tag_floor
                )));
            }
            if values.is_empty() {
                return Err(Error::Invalid(format!("custom tag {} has no values", tag)));
            }
        }

        let text = Description {
            crs: Some(crs),
            datum: Some(datum),
            shift: Some(shift),
            name: single_word("name", &layer.name)?.or(own.name),
            layer_type: single_word("type", &layer.layer_type)?.or(own.layer_type),
            extra: own.extra,
        }
        .to_string();
        if text.contains('\0') {
            return Err(Error::Invalid("image description contains NUL".to_string()));
        }
        let mut description = text.into_bytes();
        description.push(0);

        let tiepoint = TiePoint::centre(width, height, &datum, &shift)?;
        let strip = strips::flatten(&layer.grid, layer.samples_per_pixel);

        Ok(PreparedLayer {
            layer,
            width,
            height,
            samples_per_pixel: layer.samples_per_pixel,
            resolution,
            description,
            tiepoint,
            strip,
        })
    }
}

/// A name or type field: empty means unset, anything else is one word
fn single_word(field: &str, value: &str) -> Result<Option<String>> {
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::Invalid(format!(
            "layer {} {:?} must be a single word",
            field, value
        )));
    }
    Ok(Some(value.to_string()))
}

fn short(handler: &dyn ByteOrderHandler, tag: u16, value: u16) -> IFDEntry {
    let mut raw = [0u8; 4];
    raw[..2].copy_from_slice(&handler.encode_u16(value));
    IFDEntry::new(tag, field_types::SHORT, 1, raw)
}

fn long(handler: &dyn ByteOrderHandler, tag: u16, count: u32, value: u32) -> IFDEntry {
    IFDEntry::new(tag, field_types::LONG, count, handler.encode_u32(value))
}

fn at_offset(handler: &dyn ByteOrderHandler, tag: u16, field_type: u16, count: u32, offset: u32) -> IFDEntry {
    IFDEntry::new(tag, field_type, count, handler.encode_u32(offset))
}

/// Assembles the entries of one layer's directory
fn directory(
    number: usize,
    layer: &PreparedLayer<'_>,
    plan: &LayerPlan,
    handler: &dyn ByteOrderHandler,
) -> Result<IFD> {
    let mut ifd = IFD::new(number, plan.ifd_offset);
    ifd.next_offset = plan.next_ifd_offset;

    let spp = u16::try_from(layer.samples_per_pixel)
        .map_err(|_| Error::Invalid(format!("{} samples per pixel", layer.samples_per_pixel)))?;

    ifd.add_entry(long(handler, tags::IMAGE_WIDTH, 1, layer.width));
    ifd.add_entry(long(handler, tags::IMAGE_LENGTH, 1, layer.height));
    ifd.add_entry(short(handler, tags::BITS_PER_SAMPLE, 8));
    ifd.add_entry(short(handler, tags::COMPRESSION, tags::COMPRESSION_NONE));
    ifd.add_entry(short(handler, tags::PHOTOMETRIC_INTERPRETATION, tags::PHOTOMETRIC_BLACK_IS_ZERO));
    ifd.add_entry(long(handler, tags::STRIP_OFFSETS, 1, plan.strip_offset));
    ifd.add_entry(short(handler, tags::SAMPLES_PER_PIXEL, spp));
    ifd.add_entry(long(handler, tags::ROWS_PER_STRIP, 1, layer.height));
    ifd.add_entry(long(handler, tags::STRIP_BYTE_COUNTS, 1, plan.strip_len));
    ifd.add_entry(short(handler, tags::PLANAR_CONFIGURATION, tags::PLANAR_CHUNKY as u16));

    let description_len = layer.description.len() as u32;
    ifd.add_entry(match plan.description_offset {
        Some(offset) => at_offset(handler, tags::IMAGE_DESCRIPTION, field_types::ASCII, description_len, offset),
        None => {
            let mut raw = [0u8; 4];
            raw[..layer.description.len()].copy_from_slice(&layer.description);
            IFDEntry::new(tags::IMAGE_DESCRIPTION, field_types::ASCII, description_len, raw)
        }
    });

    ifd.add_entry(at_offset(handler, tags::MODEL_PIXEL_SCALE, field_types::DOUBLE, 3, plan.scale_offset));
    ifd.add_entry(at_offset(handler, tags::MODEL_TIEPOINT, field_types::DOUBLE, 6, plan.tiepoint_offset));
    ifd.add_entry(at_offset(
        handler,
        tags::GEO_KEY_DIRECTORY,
        field_types::SHORT,
        (layout::GEO_KEY_SIZE / 2) as u32,
        plan.geo_key_offset,
    ));

    for (&tag, values) in &layer.layer.custom_tags {
        let count = values.len() as u32;
        let entry = match plan.custom_offsets.get(&tag) {
            Some(&offset) => at_offset(handler, tag, field_types::LONG, count, offset),
            None => long(handler, tag, count, values[0]),
        };
        ifd.add_entry(entry);
    }

    if ifd.entry_count() != plan.entry_count as usize {
        return Err(Error::Invalid(format!(
            "layer {} has {} entries, planned {}",
            number,
            ifd.entry_count(),
            plan.entry_count
        )));
    }
    Ok(ifd)
}

/// Writes a directory in ascending tag order
fn write_directory(writer: &mut ByteWriter, ifd: &IFD, plan: &LayerPlan) -> Result<()> {
    writer.seek(plan.ifd_offset as usize)?;
    writer.write_u16(plan.entry_count)?;
    for entry in ifd.entries() {
        writer.write_u16(entry.tag)?;
        writer.write_u16(entry.field_type)?;
        writer.write_u32(entry.count)?;
        writer.write_bytes(&entry.raw_value)?;
    }
    writer.write_u32(ifd.next_offset)?;

    debug!(
        "IFD {} at offset {}: {} entries, next at {}",
        ifd.number, ifd.offset, plan.entry_count, ifd.next_offset
    );
    Ok(())
}

/// Writes the variable-length payloads of one layer
fn write_payloads(writer: &mut ByteWriter, layer: &PreparedLayer<'_>, plan: &LayerPlan) -> Result<()> {
    if let Some(offset) = plan.description_offset {
        writer.seek(offset as usize)?;
        writer.write_bytes(&layer.description)?;
    }

    writer.seek(plan.scale_offset as usize)?;
    for value in geotiff::pixel_scale(layer.resolution) {
        writer.write_f64(value)?;
    }

    writer.seek(plan.geo_key_offset as usize)?;
    for value in GeoKeyDirectory::wgs84().to_shorts() {
        writer.write_u16(value)?;
    }

    writer.seek(plan.tiepoint_offset as usize)?;
    for value in layer.tiepoint.to_doubles() {
        writer.write_f64(value)?;
    }

    for (tag, &offset) in &plan.custom_offsets {
        let values = layer.layer.custom_tags.get(tag).map(Vec::as_slice).unwrap_or_default();
        writer.seek(offset as usize)?;
        for &value in values {
            writer.write_u32(value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::formats::tiff::TiffReader;
    use crate::io::ByteOrder;
    use crate::projection::{Coordinate, Datum, Euler, Grid, Pose};
    use crate::types::Crs;

    fn gradient(rows: usize, cols: usize) -> Grid<u8> {
        let data = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| ((r + c) % 256) as u8))
            .collect();
        Grid::from_vec(rows, cols, data).unwrap()
    }

    fn collection(layers: Vec<Layer>) -> RasterCollection {
        let mut rc = RasterCollection::new(Datum::new(47.5, 8.5, 200.0), 1.5);
        for layer in layers {
            rc.push(layer);
        }
        rc
    }

    fn build(rc: &RasterCollection) -> Result<Vec<u8>> {
        TiffWriter::default().build(rc)
    }

    #[test]
    fn test_header_bytes() {
        let bytes = build(&collection(vec![Layer::new(gradient(2, 2))])).unwrap();
        assert_eq!(&bytes[..2], b"II");
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 42);
        // strip of 4 bytes at 8, IFD right after it
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 12);
        assert_eq!(&bytes[8..12], &[0, 1, 1, 2]);
    }

    #[test]
    fn test_entries_in_ascending_order() {
        let mut layer = Layer::new(gradient(2, 2));
        layer.custom_tags.insert(50010, vec![1, 2]);
        layer.custom_tags.insert(50002, vec![3]);
        let bytes = build(&collection(vec![layer])).unwrap();

        let ifd_offset = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let count = u16::from_le_bytes([bytes[ifd_offset], bytes[ifd_offset + 1]]) as usize;
        assert_eq!(count, 16);

        let tags: Vec<u16> = (0..count)
            .map(|i| {
                let at = ifd_offset + 2 + i * 12;
                u16::from_le_bytes([bytes[at], bytes[at + 1]])
            })
            .collect();
        let mut sorted = tags.clone();
        sorted.sort_unstable();
        assert_eq!(tags, sorted);
        assert_eq!(tags.first(), Some(&tags::IMAGE_WIDTH));
        assert_eq!(tags.last(), Some(&50010));
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut layer = Layer::new(gradient(3, 5));
        layer.custom_tags.insert(50001, vec![7, 8, 9]);
        layer.set_property("owner", "survey").unwrap();
        let rc = collection(vec![layer, Layer::new(gradient(1, 1))]);

        assert_eq!(build(&rc).unwrap(), build(&rc).unwrap());
    }

    #[test]
    fn test_round_trip_metadata() {
        let mut layer = Layer::new(gradient(4, 6));
        layer.crs = Some(Crs::Enu);
        layer.shift = Some(Pose::new(Coordinate::new_3d(10.0, -5.0, 1.0), Euler::from_yaw(30.0)));
        layer.name = "terrain".to_string();
        layer.layer_type = "elevation".to_string();
        layer.samples_per_pixel = 3;
        layer.custom_tags.insert(50000, vec![5]);
        layer.custom_tags.insert(50001, vec![1, 2, 3, 4]);

        let bytes = build(&collection(vec![layer])).unwrap();
        let rc = TiffReader::from_bytes(bytes).unwrap().read().unwrap();
        let read = &rc.layers[0];

        assert_eq!(read.grid, gradient(4, 6));
        assert_eq!(read.samples_per_pixel, 3);
        assert_eq!(read.strip_byte_counts, vec![72]);
        assert_eq!(read.crs, Some(Crs::Enu));
        assert_eq!(read.name, "terrain");
        assert_eq!(read.layer_type, "elevation");
        assert_eq!(read.resolution, Some(1.5));
        let shift = read.shift.unwrap();
        assert_eq!(shift.point, Coordinate::new_3d(10.0, -5.0, 1.0));
        assert_eq!(shift.angle.yaw, 30.0);
        assert_eq!(read.custom_tags[&50000], vec![5]);
        assert_eq!(read.custom_tags[&50001], vec![1, 2, 3, 4]);

        let tiepoint = read.tiepoints[0];
        assert_eq!((tiepoint.pixel_x, tiepoint.pixel_y), (3.0, 2.0));
        assert!((tiepoint.geo_y - 47.5).abs() < 1e-3);
        assert_eq!(read.geo_keys, Some(GeoKeyDirectory::wgs84()));
    }

    fn written_description(layer: Layer) -> String {
        let bytes = build(&collection(vec![layer])).unwrap();
        let rc = TiffReader::from_bytes(bytes).unwrap().read().unwrap();
        rc.layers[0].image_description.clone()
    }

    #[test]
    fn test_description_composition() {
        let mut layer = Layer::new(gradient(1, 1));
        assert_eq!(written_description(layer.clone()), "CRS WGS84 DATUM 47.5 8.5 200 SHIFT 0 0 0 0");

        layer.image_description = "NAME roads survey".to_string();
        assert_eq!(
            written_description(layer.clone()),
            "CRS WGS84 DATUM 47.5 8.5 200 SHIFT 0 0 0 0 NAME roads survey"
        );

        layer.name = "rails".to_string();
        layer.image_description = "DATUM 4 5 6 CRS ENU NAME roads".to_string();
        assert_eq!(
            written_description(layer),
            "CRS ENU DATUM 4 5 6 SHIFT 0 0 0 0 NAME rails"
        );
    }

    #[test]
    fn test_layer_fields_override_own_description() {
        let mut layer = Layer::new(gradient(2, 2));
        layer.image_description = "CRS ENU DATUM 1 2 3 SHIFT 1 1 1 10 NAME old TYPE mask".to_string();
        layer.datum = Some(Datum::new(10.0, 20.0, 30.0));
        layer.crs = Some(Crs::Wgs);
        layer.layer_type = "roads".to_string();

        let rc = TiffReader::from_bytes(build(&collection(vec![layer])).unwrap())
            .unwrap()
            .read()
            .unwrap();
        let read = &rc.layers[0];
        assert_eq!(read.datum, Some(Datum::new(10.0, 20.0, 30.0)));
        assert_eq!(read.crs, Some(Crs::Wgs));
        assert_eq!(read.name, "old");
        assert_eq!(read.layer_type, "roads");
        assert_eq!(read.shift.unwrap().angle.yaw, 10.0);
    }

    #[test]
    fn test_multi_word_name_rejected() {
        for name in ["north field", " ", "a\tb"] {
            let mut layer = Layer::new(gradient(1, 1));
            layer.name = name.to_string();
            let err = build(&collection(vec![layer])).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{:?}", name);
        }

        let mut layer = Layer::new(gradient(1, 1));
        layer.layer_type = "land cover".to_string();
        assert_eq!(build(&collection(vec![layer])).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_big_endian_output() {
        let writer = TiffWriter::new(WriteOptions { byte_order: ByteOrder::BigEndian, ..WriteOptions::default() });
        let bytes = writer.build(&collection(vec![Layer::new(gradient(2, 3))])).unwrap();
        assert_eq!(&bytes[..4], &[b'M', b'M', 0, 42]);

        let rc = TiffReader::from_bytes(bytes).unwrap().read().unwrap();
        assert_eq!(rc.layers[0].grid, gradient(2, 3));
        assert_eq!(rc.resolution, 1.5);
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(build(&RasterCollection::default()).unwrap_err(), Error::EmptyCollection));

        let mut layer = Layer::new(gradient(1, 1));
        layer.custom_tags.insert(400, vec![1]);
        assert_eq!(build(&collection(vec![layer])).unwrap_err().kind(), ErrorKind::Validation);

        let mut layer = Layer::new(gradient(1, 1));
        layer.custom_tags.insert(50000, vec![]);
        assert!(build(&collection(vec![layer])).is_err());

        let mut layer = Layer::new(gradient(1, 1));
        layer.resolution = Some(0.0);
        assert!(build(&collection(vec![layer])).is_err());

        let unanchored = RasterCollection {
            layers: vec![Layer::new(gradient(1, 1))],
            ..RasterCollection::default()
        };
        assert_eq!(build(&unanchored).unwrap_err().kind(), ErrorKind::Validation);

        assert!(build(&collection(vec![Layer::new(Grid::new(0, 3))])).is_err());
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.tif");
        let rc = collection(vec![Layer::new(gradient(3, 3))]);

        TiffWriter::default().write(&rc, &path).unwrap();
        let read = TiffReader::open(&path).unwrap().read().unwrap();
        assert_eq!(read.layers[0].grid, gradient(3, 3));
    }
}
