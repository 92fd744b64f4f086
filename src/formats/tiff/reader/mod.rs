//! TIFF reader modules

pub mod tags;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use log::{debug, info, trace, warn};
use memmap2::Mmap;
use crate::config::ReadOptions;
use crate::error::{Error, Result};
use crate::io::{ByteOrder, SeekableReader};
use crate::io::byte_order::ByteOrderHandler;
use crate::projection::Datum;
use crate::formats::tiff::{IFD, IFDEntry, Layer, RasterCollection, TIFF_MAGIC};
use crate::formats::tiff::description::Description;
use crate::formats::tiff::geotiff::{self, GeoKeyDirectory, TiePoint};
use crate::formats::tiff::strips;
use crate::formats::tiff::tags::{self as tiff_tags, field_types};

use self::tags::{read_at_most, TagReader};

/// Reads a raster collection from a TIFF byte source
pub struct TiffReader<R: SeekableReader> {
    reader: R,
    byte_order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
    first_ifd_offset: u32,
    options: ReadOptions,
}

impl TiffReader<Box<dyn SeekableReader>> {
    /// Opens a TIFF file for reading with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &ReadOptions::default())
    }

    /// Opens a TIFF file with custom options
    ///
    /// With `use_mmap` the file is memory mapped, otherwise it is read
    /// through a buffered handle. Empty files cannot be mapped and always
    /// take the buffered path.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let file = File::open(&path)?;
        let len = file.metadata()?.len();

        let reader: Box<dyn SeekableReader> = if options.use_mmap && len > 0 {
            // SAFETY: the mapping is read only and lives as long as the reader.
            // Truncating the file while it is mapped is outside our control,
            // as with every memory-mapped reader.
            let mmap = unsafe { Mmap::map(&file)? };
            Box::new(Cursor::new(mmap))
        } else {
            Box::new(BufReader::new(file))
        };

        debug!(
            "Opened {} ({} bytes, mmap: {})",
            path.as_ref().display(),
            len,
            options.use_mmap && len > 0
        );
        Self::new(reader, options.clone())
    }
}

impl TiffReader<Cursor<Vec<u8>>> {
    /// Reads from an in-memory file with default options
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(bytes), ReadOptions::default())
    }
}

impl<R: SeekableReader> TiffReader<R> {
    /// Validates the header and positions the reader at the directory chain
    pub fn new(mut reader: R, options: ReadOptions) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(&mut reader)?;
        let handler = byte_order.handler();

        let magic = handler.read_u16(&mut reader)?;
        if magic != TIFF_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        let first_ifd_offset = handler.read_u32(&mut reader)?;

        Ok(Self {
            reader,
            byte_order,
            handler,
            first_ifd_offset,
            options,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn first_ifd_offset(&self) -> u32 {
        self.first_ifd_offset
    }

    /// Reads the file and returns every layer of the chain
    ///
    /// The first layer's CRS, datum, shift and resolution become the
    /// collection defaults.
    pub fn read(&mut self) -> Result<RasterCollection> {
        let ifds = self.read_directories()?;
        let mut collection = RasterCollection::default();

        for ifd in &ifds {
            let layer = self.read_layer(ifd)?;

            if ifd.number == 0 {
                collection.crs = layer.crs.unwrap_or_default();
                collection.datum = layer.datum.unwrap_or_default();
                collection.shift = layer.shift.unwrap_or_default();
                collection.resolution = layer.resolution.unwrap_or(geotiff::DEFAULT_RESOLUTION);
            }

            collection.push(layer);
        }

        info!(
            "Parsed {} layer(s), {:?}",
            collection.len(),
            self.byte_order
        );
        Ok(collection)
    }

    /// Walks the directory chain from the header's first offset
    pub fn read_directories(&mut self) -> Result<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut next_ifd_offset = self.first_ifd_offset;

        while next_ifd_offset != 0 {
            if ifds.len() >= self.options.max_directories {
                return Err(Error::InvalidFormat(format!(
                    "Too many IFDs (limit {})",
                    self.options.max_directories
                )));
            }
            if !visited.insert(next_ifd_offset) {
                return Err(Error::InvalidFormat(format!(
                    "IFD chain loops back to offset {}",
                    next_ifd_offset
                )));
            }

            let ifd = self.read_ifd(ifds.len(), next_ifd_offset)?;
            next_ifd_offset = ifd.next_offset;
            ifds.push(ifd);
        }

        if ifds.is_empty() {
            return Err(Error::NoDirectories);
        }
        Ok(ifds)
    }

    /// Reads a single IFD at the given offset
    fn read_ifd(&mut self, number: usize, offset: u32) -> Result<IFD> {
        self.reader.seek(SeekFrom::Start(offset as u64))?;
        let entry_count = self.handler.read_u16(&mut self.reader)?;

        let mut ifd = IFD::new(number, offset);

        for _ in 0..entry_count {
            let tag = self.handler.read_u16(&mut self.reader)?;
            let field_type = self.handler.read_u16(&mut self.reader)?;
            let count = self.handler.read_u32(&mut self.reader)?;

            let mut raw_value = [0u8; 4];
            self.reader
                .read_exact(&mut raw_value)
                .map_err(|e| Error::from_read(e, 4))?;

            trace!(
                "IFD {} tag {} ({}) type {} count {}",
                number,
                tag,
                tiff_tags::tag_name(tag),
                tiff_tags::field_type_name(field_type),
                count
            );

            if ifd.add_entry(IFDEntry::new(tag, field_type, count, raw_value)).is_some() {
                warn!("IFD {} repeats tag {}; the later entry wins", number, tag);
            }
        }

        ifd.next_offset = self.handler.read_u32(&mut self.reader)?;

        debug!(
            "IFD {} at offset {}: {} entries, next at {}",
            number,
            offset,
            ifd.entry_count(),
            ifd.next_offset
        );
        Ok(ifd)
    }

    /// Decodes one directory into a layer
    fn read_layer(&mut self, ifd: &IFD) -> Result<Layer> {
        let width = self.required_u32(ifd, tiff_tags::IMAGE_WIDTH)?;
        let height = self.required_u32(ifd, tiff_tags::IMAGE_LENGTH)?;
        if width == 0 || height == 0 {
            return Err(Error::Invalid(format!(
                "IFD {} has zero dimensions {}x{}",
                ifd.number, width, height
            )));
        }

        let samples_per_pixel = self
            .optional_u32(ifd, tiff_tags::SAMPLES_PER_PIXEL)?
            .filter(|&spp| spp != 0)
            .unwrap_or(1);
        let planar_config = self
            .optional_u32(ifd, tiff_tags::PLANAR_CONFIGURATION)?
            .filter(|&pc| pc != 0)
            .unwrap_or(tiff_tags::PLANAR_CHUNKY);
        if planar_config != tiff_tags::PLANAR_CHUNKY && planar_config != tiff_tags::PLANAR_SEPARATE {
            return Err(Error::InvalidFormat(format!(
                "unsupported planar configuration {}",
                planar_config
            )));
        }

        self.check_bits_per_sample(ifd)?;
        if let Some(compression) = self.optional_u32(ifd, tiff_tags::COMPRESSION)? {
            if compression != tiff_tags::COMPRESSION_NONE as u32 {
                return Err(Error::InvalidFormat(format!(
                    "compression {} is not supported",
                    compression
                )));
            }
        }

        let (strip_offsets, strip_byte_counts) = self.read_strip_layout(ifd)?;
        let expected = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(samples_per_pixel as u64))
            .ok_or_else(|| Error::Invalid(format!(
                "IFD {}: {}x{}x{} samples overflow",
                ifd.number, width, height, samples_per_pixel
            )))?;
        let actual: u64 = strip_byte_counts.iter().map(|&c| c as u64).sum();
        if actual != expected {
            return Err(Error::StripSizeMismatch { expected, actual });
        }
        let pixels = self.read_strips(&strip_offsets, &strip_byte_counts)?;
        let grid = strips::unflatten(&pixels, width, height, samples_per_pixel, planar_config)?;

        let image_description = match ifd.get_entry(tiff_tags::IMAGE_DESCRIPTION) {
            Some(entry) => self.tag_reader().read_ascii(entry)?,
            None => String::new(),
        };
        let description = Description::parse(&image_description);
        let datum = description
            .datum
            .filter(Datum::is_set)
            .ok_or(Error::MissingDatum)?;
        if !ifd.is_geotiff() {
            warn!("IFD {} carries no GeoTIFF tags", ifd.number);
        }

        let resolution = match ifd.get_entry(tiff_tags::MODEL_PIXEL_SCALE) {
            Some(entry) => {
                let scale = self.tag_reader().read_doubles(entry)?;
                geotiff::resolution_from_scale(&scale)?
            }
            None => geotiff::DEFAULT_RESOLUTION,
        };

        let geo_keys = match ifd.get_entry(tiff_tags::GEO_KEY_DIRECTORY) {
            Some(entry) => {
                let shorts = self.tag_reader().read_u16s(entry)?;
                Some(GeoKeyDirectory::from_shorts(&shorts)?)
            }
            None => None,
        };

        let tiepoints = match ifd.get_entry(tiff_tags::MODEL_TIEPOINT) {
            Some(entry) => {
                let values = self.tag_reader().read_doubles(entry)?;
                TiePoint::from_doubles(&values)?
            }
            None => Vec::new(),
        };

        let mut layer = Layer::new(grid);
        layer.samples_per_pixel = samples_per_pixel;
        layer.planar_config = planar_config;
        layer.crs = Some(description.crs.unwrap_or_default());
        layer.datum = Some(datum);
        layer.shift = Some(description.shift.unwrap_or_default());
        layer.resolution = Some(resolution);
        layer.name = description.name.unwrap_or_default();
        layer.layer_type = description.layer_type.unwrap_or_default();
        layer.image_description = image_description;
        layer.ifd_offset = ifd.offset;
        layer.strip_offsets = strip_offsets;
        layer.strip_byte_counts = strip_byte_counts;
        layer.geo_keys = geo_keys;
        layer.tiepoints = tiepoints;

        let floor = self.options.custom_tag_floor;
        for entry in ifd.custom_entries(floor) {
            match entry.field_type {
                field_types::BYTE | field_types::SHORT | field_types::LONG => {
                    let values = self.tag_reader().read_u32s(entry)?;
                    layer.custom_tags.insert(entry.tag, values);
                }
                other => warn!(
                    "IFD {}: skipping custom tag {} of type {}",
                    ifd.number,
                    entry.tag,
                    tiff_tags::field_type_name(other)
                ),
            }
        }

        debug!(
            "Layer {}: {}x{} spp={} planar={} resolution={} custom tags={}",
            ifd.number,
            width,
            height,
            samples_per_pixel,
            planar_config,
            resolution,
            layer.custom_tags.len()
        );
        Ok(layer)
    }

    fn tag_reader(&mut self) -> TagReader<'_> {
        TagReader::new(&mut self.reader, &*self.handler)
    }

    fn required_u32(&mut self, ifd: &IFD, tag: u16) -> Result<u32> {
        self.optional_u32(ifd, tag)?.ok_or(Error::MissingTag(tag))
    }

    fn optional_u32(&mut self, ifd: &IFD, tag: u16) -> Result<Option<u32>> {
        match ifd.get_entry(tag) {
            Some(entry) => Ok(Some(self.tag_reader().read_u32(entry)?)),
            None => Ok(None),
        }
    }

    /// Every sample must be 8 bits; an absent tag means 1 bit per sample
    fn check_bits_per_sample(&mut self, ifd: &IFD) -> Result<()> {
        let bits = match ifd.get_entry(tiff_tags::BITS_PER_SAMPLE) {
            Some(entry) => self.tag_reader().read_u32s(entry)?,
            None => vec![1],
        };
        match bits.iter().find(|&&b| b != 8) {
            Some(&other) => Err(Error::UnsupportedBitDepth(other)),
            None if bits.is_empty() => Err(Error::UnsupportedBitDepth(0)),
            None => Ok(()),
        }
    }

    fn read_strip_layout(&mut self, ifd: &IFD) -> Result<(Vec<u32>, Vec<u32>)> {
        let offsets = match ifd.get_entry(tiff_tags::STRIP_OFFSETS) {
            Some(entry) => self.tag_reader().read_u32s(entry)?,
            None => Vec::new(),
        };
        let counts = match ifd.get_entry(tiff_tags::STRIP_BYTE_COUNTS) {
            Some(entry) => self.tag_reader().read_u32s(entry)?,
            None => Vec::new(),
        };

        if offsets.is_empty() || counts.is_empty() {
            return Err(Error::Invalid(format!("IFD {} has no strips", ifd.number)));
        }
        if offsets.len() != counts.len() {
            return Err(Error::Invalid(format!(
                "IFD {} has {} strip offsets but {} byte counts",
                ifd.number,
                offsets.len(),
                counts.len()
            )));
        }
        Ok((offsets, counts))
    }

    /// Concatenates the strips of one layer
    fn read_strips(&mut self, offsets: &[u32], counts: &[u32]) -> Result<Vec<u8>> {
        let mut pixels = Vec::new();
        for (&offset, &count) in offsets.iter().zip(counts) {
            self.reader.seek(SeekFrom::Start(offset as u64))?;
            read_at_most(&mut self.reader, count as usize, &mut pixels)?;
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use crate::error::ErrorKind;
    use crate::formats::tiff::tags::*;

    struct Entry {
        tag: u16,
        field_type: u16,
        count: u32,
        payload: Vec<u8>,
    }

    fn short(tag: u16, value: u16) -> Entry {
        Entry { tag, field_type: field_types::SHORT, count: 1, payload: value.to_le_bytes().to_vec() }
    }

    fn longs(tag: u16, values: &[u32]) -> Entry {
        Entry {
            tag,
            field_type: field_types::LONG,
            count: values.len() as u32,
            payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn ascii(tag: u16, text: &str) -> Entry {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        Entry { tag, field_type: field_types::ASCII, count: payload.len() as u32, payload }
    }

    fn doubles(tag: u16, values: &[f64]) -> Entry {
        Entry {
            tag,
            field_type: field_types::DOUBLE,
            count: values.len() as u32,
            payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    /// Little-endian file: header, pixels at offset 8, one IFD, overflow data
    fn assemble(pixels: &[u8], entries: &[Entry], next: Option<u32>) -> Vec<u8> {
        let ifd_offset = 8 + pixels.len() as u32;
        let mut overflow_offset = ifd_offset + 2 + entries.len() as u32 * 12 + 4;

        let mut file = b"II".to_vec();
        file.extend_from_slice(&42u16.to_le_bytes());
        file.extend_from_slice(&ifd_offset.to_le_bytes());
        file.extend_from_slice(pixels);

        let mut overflow = Vec::new();
        file.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for entry in entries {
            file.extend_from_slice(&entry.tag.to_le_bytes());
            file.extend_from_slice(&entry.field_type.to_le_bytes());
            file.extend_from_slice(&entry.count.to_le_bytes());
            if entry.payload.len() <= 4 {
                let mut raw = [0u8; 4];
                raw[..entry.payload.len()].copy_from_slice(&entry.payload);
                file.extend_from_slice(&raw);
            } else {
                file.extend_from_slice(&overflow_offset.to_le_bytes());
                overflow.extend_from_slice(&entry.payload);
                overflow_offset += entry.payload.len() as u32;
            }
        }
        file.extend_from_slice(&next.unwrap_or(0).to_le_bytes());
        file.extend_from_slice(&overflow);
        file
    }

    fn base_entries(width: u32, height: u32, description: &str) -> Vec<Entry> {
        vec![
            longs(IMAGE_WIDTH, &[width]),
            longs(IMAGE_LENGTH, &[height]),
            short(BITS_PER_SAMPLE, 8),
            short(SAMPLES_PER_PIXEL, 1),
            longs(STRIP_OFFSETS, &[8]),
            longs(STRIP_BYTE_COUNTS, &[width * height]),
            ascii(IMAGE_DESCRIPTION, description),
        ]
    }

    fn parse(bytes: Vec<u8>) -> Result<RasterCollection> {
        TiffReader::from_bytes(bytes)?.read()
    }

    const DESC: &str = "CRS WGS84 DATUM 47.5 8.5 200 SHIFT 0 0 0 0";

    #[test]
    fn test_read_minimal_layer() {
        let pixels = [1, 2, 3, 4, 5, 6];
        let rc = parse(assemble(&pixels, &base_entries(3, 2, DESC), None)).unwrap();

        assert_eq!(rc.len(), 1);
        let layer = &rc.layers[0];
        assert_eq!((layer.width(), layer.height()), (3, 2));
        assert_eq!(layer.grid[(1, 2)], 6);
        assert_eq!(layer.strip_offsets, vec![8]);
        assert_eq!(layer.strip_byte_counts, vec![6]);
        assert_eq!(layer.ifd_offset, 14);
        assert_eq!(layer.resolution, Some(1.0));
        assert_eq!(rc.datum, crate::projection::Datum::new(47.5, 8.5, 200.0));
        assert_eq!(rc.resolution, 1.0);
    }

    #[test]
    fn test_open_file_with_and_without_mmap() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&assemble(&[9; 4], &base_entries(2, 2, DESC), None)).unwrap();
        file.flush().unwrap();

        for use_mmap in [true, false] {
            let options = ReadOptions { use_mmap, ..ReadOptions::default() };
            let mut reader = TiffReader::open_with_options(file.path(), &options).unwrap();
            assert_eq!(reader.byte_order(), ByteOrder::LittleEndian);
            let rc = reader.read().unwrap();
            assert_eq!(rc.layers[0].grid.as_slice(), &[9, 9, 9, 9]);
        }
    }

    #[test]
    fn test_empty_file_is_truncated() {
        let file = NamedTempFile::new().unwrap();
        let err = TiffReader::open(file.path()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::TruncatedRead);
    }

    #[test]
    fn test_pixel_scale_and_geo_tags() {
        let mut entries = base_entries(2, 2, DESC);
        entries.push(doubles(MODEL_PIXEL_SCALE, &[0.25, 0.25, 0.0]));
        entries.push(doubles(MODEL_TIEPOINT, &[1.0, 1.0, 0.0, 8.5, 47.5, 200.0]));
        let geokeys: Vec<u8> = GeoKeyDirectory::wgs84()
            .to_shorts()
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        entries.push(Entry { tag: GEO_KEY_DIRECTORY, field_type: field_types::SHORT, count: 20, payload: geokeys });

        let rc = parse(assemble(&[0; 4], &entries, None)).unwrap();
        let layer = &rc.layers[0];
        assert_eq!(layer.resolution, Some(0.25));
        assert_eq!(layer.tiepoints.len(), 1);
        assert_eq!(layer.geo_keys.as_ref().unwrap().epsg_code(), Some(4326));
    }

    #[test]
    fn test_multiple_strips_are_concatenated() {
        let mut entries = base_entries(2, 2, DESC);
        entries[4] = longs(STRIP_OFFSETS, &[8, 10]);
        entries[5] = longs(STRIP_BYTE_COUNTS, &[2, 2]);
        let rc = parse(assemble(&[1, 2, 3, 4], &entries, None)).unwrap();
        assert_eq!(rc.layers[0].grid.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_planar_layer_keeps_first_plane() {
        let mut entries = base_entries(2, 1, DESC);
        entries[3] = short(SAMPLES_PER_PIXEL, 2);
        entries[5] = longs(STRIP_BYTE_COUNTS, &[4]);
        entries.push(short(PLANAR_CONFIGURATION, 2));

        let rc = parse(assemble(&[7, 8, 70, 80], &entries, None)).unwrap();
        let layer = &rc.layers[0];
        assert_eq!(layer.samples_per_pixel, 2);
        assert_eq!(layer.planar_config, 2);
        assert_eq!(layer.grid.as_slice(), &[7, 8]);
    }

    #[test]
    fn test_duplicate_tag_last_wins() {
        let mut entries = vec![longs(IMAGE_WIDTH, &[99])];
        entries.extend(base_entries(2, 2, DESC));
        let rc = parse(assemble(&[0; 4], &entries, None)).unwrap();
        assert_eq!(rc.layers[0].width(), 2);
    }

    #[test]
    fn test_custom_tags_are_widened() {
        let mut entries = base_entries(1, 1, DESC);
        entries.push(short(50001, 7));
        entries.push(longs(50002, &[1, 2, 3]));
        entries.push(Entry { tag: 50003, field_type: field_types::FLOAT, count: 1, payload: 1.0f32.to_le_bytes().to_vec() });
        entries.push(short(40000, 1));

        let rc = parse(assemble(&[0], &entries, None)).unwrap();
        let custom = &rc.layers[0].custom_tags;
        assert_eq!(custom.len(), 2);
        assert_eq!(custom[&50001], vec![7]);
        assert_eq!(custom[&50002], vec![1, 2, 3]);
    }

    #[test]
    fn test_bad_bit_depth_is_format_error() {
        let mut entries = base_entries(2, 2, DESC);
        entries[2] = short(BITS_PER_SAMPLE, 16);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBitDepth(16)));
        assert_eq!(err.kind(), ErrorKind::Format);

        entries.remove(2);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBitDepth(1)));
    }

    #[test]
    fn test_compressed_strips_rejected() {
        let mut entries = base_entries(2, 2, DESC);
        entries.push(short(COMPRESSION, 5));
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_missing_datum_is_validation_error() {
        let err = parse(assemble(&[0; 4], &base_entries(2, 2, "CRS WGS84 NAME x"), None)).unwrap_err();
        assert!(matches!(err, Error::MissingDatum));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut entries = base_entries(2, 2, DESC);
        entries.pop();
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert!(matches!(err, Error::MissingDatum));
    }

    #[test]
    fn test_unset_datum_is_missing() {
        for text in ["CRS WGS84 DATUM 0.00 0.0 0.0", "DATUM NaN 8.5 200", "DATUM 47.5 inf 200"] {
            let err = parse(assemble(&[0; 4], &base_entries(2, 2, text), None)).unwrap_err();
            assert!(matches!(err, Error::MissingDatum), "{}", text);
        }
    }

    #[test]
    fn test_huge_payload_count_is_truncated_read() {
        let mut entries = base_entries(2, 2, DESC);
        let mut scale = doubles(MODEL_PIXEL_SCALE, &[1.0, 1.0, 0.0]);
        scale.count = u32::MAX;
        entries.push(scale);

        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedRead);
    }

    #[test]
    fn test_huge_strip_is_truncated_read() {
        let mut entries = base_entries(60_000, 60_000, DESC);
        entries[5] = longs(STRIP_BYTE_COUNTS, &[3_600_000_000]);

        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedRead);
    }

    #[test]
    fn test_zero_or_missing_dimensions() {
        let mut entries = base_entries(2, 2, DESC);
        entries[0] = longs(IMAGE_WIDTH, &[0]);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        entries.remove(0);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert!(matches!(err, Error::MissingTag(IMAGE_WIDTH)));
    }

    #[test]
    fn test_strip_errors() {
        let mut entries = base_entries(2, 2, DESC);
        entries[5] = longs(STRIP_BYTE_COUNTS, &[3]);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert!(matches!(err, Error::StripSizeMismatch { expected: 4, actual: 3 }));

        let mut entries = base_entries(2, 2, DESC);
        entries[5] = longs(STRIP_BYTE_COUNTS, &[2, 2]);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut entries = base_entries(2, 2, DESC);
        entries.remove(4);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_strip_past_end_is_truncated_read() {
        let mut entries = base_entries(2, 2, DESC);
        entries[4] = longs(STRIP_OFFSETS, &[100_000]);
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedRead);
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let mut entries = base_entries(2, 2, DESC);
        entries.push(doubles(MODEL_PIXEL_SCALE, &[-1.0, 1.0, 0.0]));
        let err = parse(assemble(&[0; 4], &entries, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_header_errors() {
        let err = parse(b"hello, this is not a raster".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidByteOrder(_)));
        assert_eq!(err.kind(), ErrorKind::Format);

        let mut bytes = assemble(&[0; 4], &base_entries(2, 2, DESC), None);
        bytes[2] = 43;
        assert!(matches!(parse(bytes).unwrap_err(), Error::InvalidMagic(43)));

        assert_eq!(parse(b"II*".to_vec()).unwrap_err().kind(), ErrorKind::TruncatedRead);
    }

    #[test]
    fn test_no_directories() {
        let mut bytes = b"II".to_vec();
        bytes.extend_from_slice(&42u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let err = parse(bytes).unwrap_err();
        assert!(matches!(err, Error::NoDirectories));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_chain_loop_is_rejected() {
        let ifd_offset = 8 + 4;
        let bytes = assemble(&[0; 4], &base_entries(2, 2, DESC), Some(ifd_offset));
        let err = parse(bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_directory_limit() {
        let bytes = assemble(&[0; 4], &base_entries(2, 2, DESC), None);
        let options = ReadOptions { max_directories: 0, ..ReadOptions::default() };
        let mut reader = TiffReader::new(Cursor::new(bytes), options).unwrap();
        let err = reader.read().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
