//! The raster side of a copy: what the writer needs to know about the pixels
//! it encodes and where they are on the ground.

use std::fmt::Display;

use fnv::FnvHashMap;

use crate::error::{GbError, Result};

/// Sample type of the source bands. Only [`DataType::Byte`] is written
/// without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Byte => "Byte",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
        };
        f.write_str(name)
    }
}

/// Palette entry. The fourth component is carried along but PDF indexed
/// color spaces only use the first three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorEntry {
    pub c1: u8,
    pub c2: u8,
    pub c3: u8,
    pub c4: u8,
}

impl ColorEntry {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            c1: r,
            c2: g,
            c3: b,
            c4: 255,
        }
    }
}

/// Affine pixel to georeferenced mapping:
///
/// ```text
/// x = gt[0] + pixel * gt[1] + line * gt[2]
/// y = gt[3] + pixel * gt[4] + line * gt[5]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn apply(&self, pixel: f64, line: f64) -> (f64, f64) {
        let gt = &self.0;
        (
            gt[0] + pixel * gt[1] + line * gt[2],
            gt[3] + pixel * gt[4] + line * gt[5],
        )
    }

    /// The inverse mapping, `None` for a singular transform.
    pub fn invert(&self) -> Option<GeoTransform> {
        let gt = &self.0;
        let det = gt[1] * gt[5] - gt[2] * gt[4];
        if det.abs() < 1e-15 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(GeoTransform([
            (gt[2] * gt[3] - gt[0] * gt[5]) * inv_det,
            gt[5] * inv_det,
            -gt[2] * inv_det,
            (-gt[1] * gt[3] + gt[0] * gt[4]) * inv_det,
            -gt[4] * inv_det,
            gt[1] * inv_det,
        ]))
    }
}

/// Ground control point: `(pixel, line)` in the raster is `(x, y)` in the
/// GCP projection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Gcp {
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
}

impl Gcp {
    pub const fn new(pixel: f64, line: f64, x: f64, y: f64) -> Self {
        Self { pixel, line, x, y }
    }
}

/// Pixel rectangle of a read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the PDF writer reads from a raster dataset.
///
/// Bands are numbered from 1. Reads return one byte per sample, sources with
/// wider data types convert on read.
pub trait RasterSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn band_count(&self) -> usize;
    fn data_type(&self) -> DataType;

    fn geo_transform(&self) -> Option<GeoTransform>;
    /// CRS definition belonging to the geotransform.
    fn projection(&self) -> Option<&str>;
    fn gcps(&self) -> &[Gcp];
    /// CRS definition belonging to the GCPs.
    fn gcp_projection(&self) -> Option<&str>;

    /// Item of the default metadata domain, e.g. `NEATLINE` or `AUTHOR`.
    fn metadata_item(&self, key: &str) -> Option<&str>;
    /// XMP packet of the dataset, if any.
    fn xmp(&self) -> Option<&str> {
        None
    }

    /// Palette of band 1.
    fn color_table(&self) -> Option<&[ColorEntry]>;

    /// Read `window` of `band` row by row into `buf`, which holds exactly
    /// `window.len()` bytes.
    fn read_band(&self, band: usize, window: Window, buf: &mut [u8]) -> Result<()>;

    /// Read the first `bands` bands pixel interleaved.
    fn read_interleaved(&self, bands: usize, window: Window, buf: &mut [u8]) -> Result<()> {
        if buf.len() != window.len() * bands {
            return Err(GbError::Raster(format!(
                "buffer of {} bytes for {} bands of {}x{}",
                buf.len(),
                bands,
                window.width,
                window.height
            )));
        }
        if bands == 1 {
            return self.read_band(1, window, buf);
        }
        let mut plane = vec![0u8; window.len()];
        for band in 0..bands {
            self.read_band(band + 1, window, &mut plane)?;
            for (i, v) in plane.iter().enumerate() {
                buf[i * bands + band] = *v;
            }
        }
        Ok(())
    }
}

/// Fit an affine transform through `gcps`.
///
/// The fit is accepted only when every GCP lands within a quarter pixel of
/// its georeferenced position, i.e. the GCPs describe a (nearly) exact
/// affine grid.
pub fn gcps_to_geo_transform(gcps: &[Gcp]) -> Option<GeoTransform> {
    if gcps.len() < 3 {
        return None;
    }
    let n = gcps.len() as f64;
    let mean = |f: fn(&Gcp) -> f64| gcps.iter().map(f).sum::<f64>() / n;
    let (mp, ml, mx, my) = (mean(|g| g.pixel), mean(|g| g.line), mean(|g| g.x), mean(|g| g.y));

    let (mut spp, mut spl, mut sll) = (0.0, 0.0, 0.0);
    let (mut spx, mut slx, mut spy, mut sly) = (0.0, 0.0, 0.0, 0.0);
    for g in gcps {
        let (p, l, x, y) = (g.pixel - mp, g.line - ml, g.x - mx, g.y - my);
        spp += p * p;
        spl += p * l;
        sll += l * l;
        spx += p * x;
        slx += l * x;
        spy += p * y;
        sly += l * y;
    }
    let det = spp * sll - spl * spl;
    if det.abs() < 1e-12 {
        return None;
    }

    let gt1 = (sll * spx - spl * slx) / det;
    let gt2 = (spp * slx - spl * spx) / det;
    let gt4 = (sll * spy - spl * sly) / det;
    let gt5 = (spp * sly - spl * spy) / det;
    let gt = GeoTransform([mx - gt1 * mp - gt2 * ml, gt1, gt2, my - gt4 * mp - gt5 * ml, gt4, gt5]);

    let pixel_size = 0.5 * (gt1.abs() + gt2.abs() + gt4.abs() + gt5.abs());
    let exact = gcps.iter().all(|g| {
        let (x, y) = gt.apply(g.pixel, g.line);
        (x - g.x).abs() <= 0.25 * pixel_size && (y - g.y).abs() <= 0.25 * pixel_size
    });
    exact.then_some(gt)
}

/// Raster held in memory, one plane per band.
#[derive(Debug, Clone)]
pub struct MemRaster {
    width: usize,
    height: usize,
    bands: Vec<Vec<u8>>,
    data_type: DataType,
    geo_transform: Option<GeoTransform>,
    projection: Option<String>,
    gcps: Vec<Gcp>,
    gcp_projection: Option<String>,
    metadata: FnvHashMap<String, String>,
    xmp: Option<String>,
    color_table: Option<Vec<ColorEntry>>,
}

impl MemRaster {
    /// Zero filled raster.
    pub fn new(width: usize, height: usize, band_count: usize) -> Self {
        Self {
            width,
            height,
            bands: vec![vec![0; width * height]; band_count],
            data_type: DataType::Byte,
            geo_transform: None,
            projection: None,
            gcps: Vec::new(),
            gcp_projection: None,
            metadata: FnvHashMap::default(),
            xmp: None,
            color_table: None,
        }
    }

    pub fn from_bands(width: usize, height: usize, bands: Vec<Vec<u8>>) -> Result<Self> {
        if let Some(bad) = bands.iter().position(|b| b.len() != width * height) {
            return Err(GbError::Raster(format!(
                "band {} holds {} samples, expected {}",
                bad + 1,
                bands[bad].len(),
                width * height
            )));
        }
        let mut raster = Self::new(0, 0, 0);
        raster.width = width;
        raster.height = height;
        raster.bands = bands;
        Ok(raster)
    }

    /// Plane of `band` (1-based).
    pub fn band_mut(&mut self, band: usize) -> Option<&mut [u8]> {
        self.bands.get_mut(band.checked_sub(1)?).map(|b| &mut b[..])
    }

    pub fn fill(mut self, band: usize, value: u8) -> Self {
        if let Some(plane) = self.band_mut(band) {
            plane.fill(value);
        }
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_geo_transform(mut self, gt: GeoTransform, projection: &str) -> Self {
        self.geo_transform = Some(gt);
        self.projection = Some(projection.to_owned());
        self
    }

    pub fn with_gcps(mut self, gcps: Vec<Gcp>, projection: &str) -> Self {
        self.gcps = gcps;
        self.gcp_projection = Some(projection.to_owned());
        self
    }

    /// Metadata keys are case insensitive.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_ascii_uppercase(), value.to_owned());
        self
    }

    pub fn with_xmp(mut self, xmp: &str) -> Self {
        self.xmp = Some(xmp.to_owned());
        self
    }

    pub fn with_color_table(mut self, table: Vec<ColorEntry>) -> Self {
        self.color_table = Some(table);
        self
    }
}

impl RasterSource for MemRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    fn gcps(&self) -> &[Gcp] {
        &self.gcps
    }

    fn gcp_projection(&self) -> Option<&str> {
        self.gcp_projection.as_deref()
    }

    fn metadata_item(&self, key: &str) -> Option<&str> {
        self.metadata.get(&key.to_ascii_uppercase()).map(String::as_str)
    }

    fn xmp(&self) -> Option<&str> {
        self.xmp.as_deref()
    }

    fn color_table(&self) -> Option<&[ColorEntry]> {
        self.color_table.as_deref()
    }

    fn read_band(&self, band: usize, window: Window, buf: &mut [u8]) -> Result<()> {
        let plane = band
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or_else(|| GbError::Raster(format!("no band {}", band)))?;
        if window.x + window.width > self.width || window.y + window.height > self.height {
            return Err(GbError::Raster(format!(
                "window {:?} outside of {}x{}",
                window, self.width, self.height
            )));
        }
        if buf.len() != window.len() {
            return Err(GbError::Raster(format!(
                "buffer of {} bytes for a {}x{} window",
                buf.len(),
                window.width,
                window.height
            )));
        }
        if window.width == 0 {
            return Ok(());
        }
        for (row, out) in buf.chunks_exact_mut(window.width).enumerate() {
            let start = (window.y + row) * self.width + window.x;
            out.copy_from_slice(&plane[start..start + window.width]);
        }
        Ok(())
    }
}
