//! Creation and update options.
//!
//! Options arrive as `KEY=VALUE` style string pairs. Keys are matched case
//! insensitively, values keep their case.

use fnv::FnvHashMap;

use crate::error::{GbError, Result};

/// Page margins in 1/72 inch, applied around the raster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn uniform(margin: i32) -> Self {
        Self {
            left: margin,
            right: margin,
            top: margin,
            bottom: margin,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    #[default]
    Deflate,
    Jpeg,
    Jpeg2000,
}

impl Compression {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "DEFLATE" => Some(Self::Deflate),
            "JPEG" => Some(Self::Jpeg),
            "JPEG2000" => Some(Self::Jpeg2000),
            _ => None,
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg | Self::Jpeg2000)
    }
}

/// Georeferencing convention(s) written for a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeoEncoding {
    None,
    #[default]
    Iso32000,
    OgcBp,
    Both,
}

impl GeoEncoding {
    /// Unknown names select no georeferencing at all.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "ISO32000" => Self::Iso32000,
            "OGC_BP" => Self::OgcBp,
            "BOTH" => Self::Both,
            "NONE" => Self::None,
            _ => {
                log::warn!("unknown geo encoding {}, no georeferencing is written", value);
                Self::None
            }
        }
    }

    pub fn iso32000(self) -> bool {
        matches!(self, Self::Iso32000 | Self::Both)
    }

    pub fn ogc_bp(self) -> bool {
        matches!(self, Self::OgcBp | Self::Both)
    }
}

/// `YES/NO`, `TRUE/FALSE`, `ON/OFF` and `1/0`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_uppercase().as_str() {
        "YES" | "TRUE" | "ON" | "1" => Some(true),
        "NO" | "FALSE" | "OFF" | "0" => Some(false),
        _ => None,
    }
}

fn parse_int(key: &str, value: &str) -> Option<i64> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        log::warn!("{}={} is not an integer, ignoring", key, value);
    }
    parsed
}

/// Document information entries. Each one overrides the dataset metadata item
/// of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoOptions {
    pub author: Option<String>,
    pub producer: Option<String>,
    pub creator: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub keywords: Option<String>,
}

impl InfoOptions {
    /// `(Info key, metadata and option key, value)` in the order the entries
    /// are written.
    pub(crate) fn entries(&self) -> [(&'static str, &'static str, Option<&str>); 7] {
        [
            ("Author", "AUTHOR", self.author.as_deref()),
            ("Producer", "PRODUCER", self.producer.as_deref()),
            ("Creator", "CREATOR", self.creator.as_deref()),
            ("CreationDate", "CREATION_DATE", self.creation_date.as_deref()),
            ("Subject", "SUBJECT", self.subject.as_deref()),
            ("Title", "TITLE", self.title.as_deref()),
            ("Keywords", "KEYWORDS", self.keywords.as_deref()),
        ]
    }
}

/// Everything `create_copy` can be told.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOptions {
    pub compression: Compression,
    /// `2` enables horizontal differencing for DEFLATE.
    pub predictor: u8,
    pub jpeg_quality: Option<u8>,
    pub jpeg2000_driver: Option<String>,
    pub tiled: bool,
    pub block_x_size: Option<i64>,
    pub block_y_size: Option<i64>,
    pub geo_encoding: GeoEncoding,
    pub dpi: f64,
    /// Neatline WKT, or `NO` to suppress the OGC neatline.
    pub neatline: Option<String>,
    pub margins: Margins,
    /// XMP packet, or a value starting with `NO` to suppress it.
    pub xmp: Option<String>,
    pub write_info: bool,
    pub info: InfoOptions,
    pub extra_content_stream: Option<String>,
    pub layer_name: Option<String>,
    pub extra_content_layer_name: Option<String>,
    /// Stamp the source WKT onto the OGC projection dictionary.
    pub ogc_bp_write_wkt: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            predictor: 1,
            jpeg_quality: None,
            jpeg2000_driver: None,
            tiled: false,
            block_x_size: None,
            block_y_size: None,
            geo_encoding: GeoEncoding::default(),
            dpi: 72.0,
            neatline: None,
            margins: Margins::default(),
            xmp: None,
            write_info: true,
            info: InfoOptions::default(),
            extra_content_stream: None,
            layer_name: None,
            extra_content_layer_name: None,
            ogc_bp_write_wkt: true,
        }
    }
}

impl CreateOptions {
    /// Parse option pairs. With `strict` an unknown compression is an error,
    /// otherwise every bad value is reported and replaced by its default.
    pub fn parse<K, V>(pairs: impl IntoIterator<Item = (K, V)>, strict: bool) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map: FnvHashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_uppercase(), v.as_ref().to_owned()))
            .collect();
        let get = |key: &str| map.get(key).map(String::as_str);
        let owned = |key: &str| get(key).map(str::to_owned);

        let mut options = Self::default();

        if let Some(value) = get("COMPRESS") {
            match Compression::parse(value) {
                Some(compression) => options.compression = compression,
                None if strict => return Err(GbError::InvalidOption(format!("unsupported COMPRESS={}", value))),
                None => log::warn!("unsupported value for COMPRESS: {}", value),
            }
        }

        if let Some(value) = get("PREDICTOR") {
            if options.compression != Compression::Deflate {
                log::warn!("PREDICTOR option is only taken into account for DEFLATE compression");
            } else {
                match value.trim().parse::<u8>() {
                    Ok(p @ (1 | 2)) => options.predictor = p,
                    _ => log::warn!("supported PREDICTOR values are 1 or 2"),
                }
            }
        }

        if let Some(value) = get("JPEG_QUALITY") {
            match value.trim().parse::<u8>() {
                Ok(q) if (1..=100).contains(&q) => options.jpeg_quality = Some(q),
                _ => log::warn!("JPEG_QUALITY={} value not recognised, ignoring", value),
            }
        }

        options.jpeg2000_driver = owned("JPEG2000_DRIVER");
        options.tiled = get("TILED").map_or(false, |v| parse_bool(v).unwrap_or(true));
        options.block_x_size = get("BLOCKXSIZE").and_then(|v| parse_int("BLOCKXSIZE", v));
        options.block_y_size = get("BLOCKYSIZE").and_then(|v| parse_int("BLOCKYSIZE", v));

        if let Some(value) = get("GEO_ENCODING") {
            options.geo_encoding = GeoEncoding::parse(value);
        }

        if let Some(value) = get("DPI") {
            match value.trim().parse::<f64>() {
                Ok(dpi) if dpi >= 72.0 => options.dpi = dpi,
                Ok(_) => log::debug!("DPI below 72, using 72"),
                Err(_) => log::warn!("DPI={} is not a number, using 72", value),
            }
        }

        options.neatline = owned("NEATLINE");

        let margin = |key: &str| get(key).and_then(|v| parse_int(key, v)).map(|m| m as i32);
        options.margins = Margins::uniform(margin("MARGIN").unwrap_or(0));
        if let Some(m) = margin("LEFT_MARGIN") {
            options.margins.left = m;
        }
        if let Some(m) = margin("RIGHT_MARGIN") {
            options.margins.right = m;
        }
        if let Some(m) = margin("TOP_MARGIN") {
            options.margins.top = m;
        }
        if let Some(m) = margin("BOTTOM_MARGIN") {
            options.margins.bottom = m;
        }

        options.xmp = owned("XMP");
        options.write_info = get("WRITE_INFO").map_or(true, |v| parse_bool(v).unwrap_or(true));
        options.info = InfoOptions {
            author: owned("AUTHOR"),
            producer: owned("PRODUCER"),
            creator: owned("CREATOR"),
            creation_date: owned("CREATION_DATE"),
            subject: owned("SUBJECT"),
            title: owned("TITLE"),
            keywords: owned("KEYWORDS"),
        };

        options.extra_content_stream = owned("EXTRA_CONTENT_STREAM");
        options.layer_name = owned("LAYER_NAME");
        options.extra_content_layer_name = owned("EXTRA_CONTENT_LAYER_NAME");
        Ok(options)
    }

    /// Block size for a `width` x `height` raster. Explicit sizes that are
    /// not positive or not smaller than the raster select the full extent.
    pub fn block_size(&self, width: usize, height: usize) -> (usize, usize) {
        let (mut bw, mut bh) = if self.tiled { (256, 256) } else { (width, height) };
        let clamp = |value: i64, full: usize| match usize::try_from(value) {
            Ok(v) if v > 0 && v < full => v,
            _ => full,
        };
        if let Some(v) = self.block_x_size {
            bw = clamp(v, width);
        }
        if let Some(v) = self.block_y_size {
            bh = clamp(v, height);
        }
        (bw.max(1), bh.max(1))
    }
}

pub const ENV_GEO_ENCODING: &str = "GDAL_PDF_GEO_ENCODING";
pub const ENV_OGC_BP_WRITE_WKT: &str = "GDAL_PDF_OGC_BP_WRITE_WKT";

/// Settings of the georeferencing update of an existing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub geo_encoding: GeoEncoding,
    pub write_wkt: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            geo_encoding: GeoEncoding::Iso32000,
            write_wkt: true,
        }
    }
}

impl UpdateOptions {
    /// Read the process wide overrides.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(ENV_GEO_ENCODING).ok().as_deref(),
            std::env::var(ENV_OGC_BP_WRITE_WKT).ok().as_deref(),
        )
    }

    fn from_values(geo_encoding: Option<&str>, write_wkt: Option<&str>) -> Self {
        let mut options = Self::default();
        if let Some(value) = geo_encoding {
            options.geo_encoding = GeoEncoding::parse(value);
        }
        if let Some(value) = write_wkt {
            options.write_wkt = parse_bool(value).unwrap_or(true);
        }
        options
    }

    pub fn with_geo_encoding(mut self, geo_encoding: GeoEncoding) -> Self {
        self.geo_encoding = geo_encoding;
        self
    }

    pub fn with_write_wkt(mut self, write_wkt: bool) -> Self {
        self.write_wkt = write_wkt;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> CreateOptions {
        CreateOptions::parse(pairs.iter().copied(), false).unwrap()
    }

    #[test]
    fn defaults() {
        let options = parse(&[]);
        assert_eq!(options, CreateOptions::default());
        assert_eq!(options.compression, Compression::Deflate);
        assert_eq!(options.geo_encoding, GeoEncoding::Iso32000);
        assert_eq!(options.dpi, 72.0);
        assert!(options.write_info);
        assert_eq!(options.block_size(300, 200), (300, 200));
    }

    #[test]
    fn keys_ignore_case() {
        let options = parse(&[("compress", "jpeg"), ("Jpeg_Quality", "80"), ("geo_encoding", "both")]);
        assert_eq!(options.compression, Compression::Jpeg);
        assert_eq!(options.jpeg_quality, Some(80));
        assert_eq!(options.geo_encoding, GeoEncoding::Both);
        assert!(options.geo_encoding.iso32000() && options.geo_encoding.ogc_bp());
    }

    #[test]
    fn bad_values_fall_back() {
        let options = parse(&[("COMPRESS", "LZW"), ("JPEG_QUALITY", "0"), ("DPI", "50"), ("PREDICTOR", "3")]);
        assert_eq!(options.compression, Compression::Deflate);
        assert_eq!(options.jpeg_quality, None);
        assert_eq!(options.dpi, 72.0);
        assert_eq!(options.predictor, 1);

        assert!(CreateOptions::parse([("COMPRESS", "LZW")], true).is_err());
    }

    #[test]
    fn predictor_needs_deflate() {
        assert_eq!(parse(&[("PREDICTOR", "2")]).predictor, 2);
        assert_eq!(parse(&[("COMPRESS", "NONE"), ("PREDICTOR", "2")]).predictor, 1);
    }

    #[test]
    fn margins() {
        let options = parse(&[("MARGIN", "10"), ("LEFT_MARGIN", "3"), ("BOTTOM_MARGIN", "-2")]);
        assert_eq!(
            options.margins,
            Margins {
                left: 3,
                right: 10,
                top: 10,
                bottom: -2
            }
        );
    }

    #[test]
    fn block_sizes() {
        assert_eq!(parse(&[("TILED", "YES")]).block_size(1000, 600), (256, 256));
        assert_eq!(parse(&[("TILED", "YES"), ("BLOCKXSIZE", "100")]).block_size(1000, 600), (100, 256));
        assert_eq!(parse(&[("BLOCKXSIZE", "-5"), ("BLOCKYSIZE", "600")]).block_size(1000, 600), (1000, 600));
        assert_eq!(parse(&[("BLOCKYSIZE", "64")]).block_size(1000, 600), (1000, 64));
    }

    #[test]
    fn booleans() {
        assert!(!parse(&[("WRITE_INFO", "off")]).write_info);
        assert!(parse(&[("WRITE_INFO", "1")]).write_info);
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn update_overrides() {
        let options = UpdateOptions::from_values(Some("OGC_BP"), Some("NO"));
        assert_eq!(options.geo_encoding, GeoEncoding::OgcBp);
        assert!(!options.write_wkt);

        let options = options.with_geo_encoding(GeoEncoding::Both).with_write_wkt(true);
        assert_eq!(options, UpdateOptions {
            geo_encoding: GeoEncoding::Both,
            write_wkt: true
        });
        assert_eq!(UpdateOptions::from_values(None, None), UpdateOptions::default());
    }
}
