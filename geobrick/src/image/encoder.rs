use image::{codecs::jpeg, ExtendedColorType, ImageEncoder as _};

use crate::{
    error::{GbError, Result},
    options::Compression,
};

/// JPEG2000 backends in order of preference.
const JPEG2000_BACKENDS: [&str; 4] = ["JP2KAK", "JP2ECW", "JP2OpenJPEG", "JPEG2000"];

/// Quality used when none is requested.
const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Pixel interleaved 8 bit samples of one block.
#[derive(Debug, Clone, Copy)]
pub struct BlockImage<'a> {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub data: &'a [u8],
}

/// `NAME=VALUE` creation options handed to an encoder.
pub type EncoderOptions = Vec<(String, String)>;

/// Produces the complete byte stream embedded in an image XObject.
pub trait ImageEncoder {
    /// Backend name, e.g. `JPEG` or `JP2OpenJPEG`.
    fn name(&self) -> &str;
    fn codec(&self) -> Compression;
    fn encode(&self, block: &BlockImage, options: &[(String, String)]) -> Result<Vec<u8>>;
}

/// Baseline JPEG through the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn name(&self) -> &str {
        "JPEG"
    }

    fn codec(&self) -> Compression {
        Compression::Jpeg
    }

    fn encode(&self, block: &BlockImage, options: &[(String, String)]) -> Result<Vec<u8>> {
        let quality = options
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("QUALITY"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(DEFAULT_JPEG_QUALITY);
        let color = match block.bands {
            1 => ExtendedColorType::L8,
            3 => ExtendedColorType::Rgb8,
            n => return Err(GbError::Codec(format!("JPEG cannot encode {} bands", n))),
        };
        let (width, height) = match (u32::try_from(block.width), u32::try_from(block.height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(GbError::Codec("block too large for JPEG".to_owned())),
        };

        let mut out = Vec::new();
        jpeg::JpegEncoder::new_with_quality(&mut out, quality)
            .write_image(block.data, width, height, color)
            .map_err(|e| GbError::Codec(e.to_string()))?;
        Ok(out)
    }
}

/// Known image encoders, looked up by codec and backend name.
pub struct EncoderRegistry {
    encoders: Vec<Box<dyn ImageEncoder>>,
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self {
            encoders: vec![Box::new(JpegEncoder)],
        }
    }
}

impl EncoderRegistry {
    pub fn empty() -> Self {
        Self { encoders: Vec::new() }
    }

    pub fn register(&mut self, encoder: Box<dyn ImageEncoder>) {
        self.encoders.push(encoder);
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn ImageEncoder> {
        self.encoders
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .map(|e| &**e)
    }

    /// Encoder and creation options for `compression`.
    ///
    /// JPEG2000 picks the first available backend in preference order,
    /// restricted to `jpeg2000_driver` if one is named.
    pub fn resolve(
        &self,
        compression: Compression,
        jpeg_quality: Option<u8>,
        jpeg2000_driver: Option<&str>,
    ) -> Result<(&dyn ImageEncoder, EncoderOptions)> {
        match compression {
            Compression::Jpeg => {
                let encoder = self
                    .by_name("JPEG")
                    .filter(|e| e.codec() == Compression::Jpeg)
                    .ok_or_else(|| GbError::NotSupported("no JPEG driver found".to_owned()))?;
                let options = jpeg_quality
                    .map(|q| vec![("QUALITY".to_owned(), q.to_string())])
                    .unwrap_or_default();
                Ok((encoder, options))
            }
            Compression::Jpeg2000 => {
                let wanted = |name: &&str| jpeg2000_driver.map_or(true, |d| d.eq_ignore_ascii_case(name));
                let encoder = JPEG2000_BACKENDS
                    .iter()
                    .copied()
                    .filter(wanted)
                    .find_map(|name| self.by_name(name).filter(|e| e.codec() == Compression::Jpeg2000))
                    .ok_or_else(|| GbError::NotSupported("no JPEG2000 driver found".to_owned()))?;
                let options = if encoder.name().eq_ignore_ascii_case("JP2ECW") {
                    [("PROFILE", "NPJE"), ("LAYERS", "1"), ("GeoJP2", "OFF"), ("GMLJP2", "OFF")]
                        .iter()
                        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                        .collect()
                } else {
                    Vec::new()
                };
                Ok((encoder, options))
            }
            other => Err(GbError::NotSupported(format!("{:?} has no image encoder", other))),
        }
    }
}
