//! One shot conversion of a raster into a single page document.

use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use crate::{
    document::DocumentWriter,
    error::{GbError, Result},
    image::EncoderRegistry,
    options::CreateOptions,
    progress::Progress,
    raster::{DataType, RasterSource},
    srs::{SpatialRefService, WktSpatialRefService},
};

/// Settings of a copy. Built from [`CreateOptions`] or from `NAME=VALUE`
/// pairs.
pub struct CreateCopy {
    options: CreateOptions,
    strict: bool,
    encoders: EncoderRegistry,
    srs: Box<dyn SpatialRefService>,
}

impl CreateCopy {
    pub fn new(options: CreateOptions) -> Self {
        Self {
            options,
            strict: false,
            encoders: EncoderRegistry::default(),
            srs: Box::new(WktSpatialRefService),
        }
    }

    /// Parse option pairs. `strict` turns unsupported values into errors.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>, strict: bool) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(Self::new(CreateOptions::parse(pairs, strict)?).strict(strict))
    }

    /// Refuse sources that can only be written lossy.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn with_srs(mut self, srs: Box<dyn SpatialRefService>) -> Self {
        self.srs = srs;
        self
    }

    pub fn options(&self) -> &CreateOptions {
        &self.options
    }

    fn check_source(&self, source: &dyn RasterSource) -> Result<()> {
        let bands = source.band_count();
        if !matches!(bands, 1 | 3 | 4) {
            return Err(GbError::InvalidSource(format!(
                "{} bands are not supported, must be 1 (gray or with color table), 3 (RGB) or 4 bands",
                bands
            )));
        }

        let data_type = source.data_type();
        if data_type != DataType::Byte {
            if self.strict {
                return Err(GbError::InvalidSource(format!(
                    "data type {} is not supported, only 8 bit bands are",
                    data_type
                )));
            }
            log::warn!("data type {} is not supported, samples are converted to 8 bit", data_type);
        }

        if bands == 1 && source.color_table().is_some() && self.options.compression.is_lossy() {
            log::warn!(
                "the source has a color table, which does not suit {:?} compression; \
                 consider expanding the color table first",
                self.options.compression
            );
        }
        Ok(())
    }

    /// Write `source` as a complete document to `out` and return the stream.
    ///
    /// Nothing is written if the source is rejected. After a failure during
    /// the imagery `out` holds an incomplete document.
    pub fn write_to<W: Write>(self, source: &dyn RasterSource, out: W, progress: &mut dyn Progress) -> Result<W> {
        self.begin(source, progress)?;
        self.write_document(source, out, progress)
    }

    /// Write `source` to a new file at `path` and reopen it read only. A
    /// failed copy leaves no file behind.
    pub fn to_file(self, path: impl AsRef<Path>, source: &dyn RasterSource, progress: &mut dyn Progress) -> Result<File> {
        let path = path.as_ref();
        self.begin(source, progress)?;

        let file = File::create(path)?;
        match self.write_document(source, file, progress) {
            Ok(file) => {
                drop(file);
                log::info!("wrote {}", path.display());
                Ok(File::open(path)?)
            }
            Err(e) => {
                if matches!(e, GbError::Cancelled) {
                    log::warn!("copy to {} cancelled", path.display());
                }
                if let Err(remove) = fs::remove_file(path) {
                    log::warn!("cannot remove {}: {}", path.display(), remove);
                }
                Err(e)
            }
        }
    }

    fn begin(&self, source: &dyn RasterSource, progress: &mut dyn Progress) -> Result<()> {
        if !progress.report(0.0) {
            return Err(GbError::Cancelled);
        }
        self.check_source(source)
    }

    fn write_document<W: Write>(self, source: &dyn RasterSource, out: W, progress: &mut dyn Progress) -> Result<W> {
        let options = self.options;
        let mut writer = DocumentWriter::new(out)?
            .with_encoders(self.encoders)
            .with_srs(self.srs);

        if options.write_info {
            writer.set_info(source, &options.info)?;
        }
        writer.set_xmp(source, options.xmp.as_deref())?;
        writer.start_page(source, &options)?;
        writer.write_imagery(source, &options, progress)?;
        writer.end_page(
            options.layer_name.as_deref(),
            options.extra_content_stream.as_deref(),
            options.extra_content_layer_name.as_deref(),
        )?;
        writer.into_inner()
    }
}

/// Copy `source` into a new document at `path`.
///
/// `options` are `NAME=VALUE` creation options, e.g. `("COMPRESS", "JPEG")`.
/// `progress` is told the completed fraction and may cancel the copy.
pub fn create_copy<K, V>(
    path: impl AsRef<Path>,
    source: &dyn RasterSource,
    strict: bool,
    options: impl IntoIterator<Item = (K, V)>,
    progress: &mut dyn Progress,
) -> Result<File>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    CreateCopy::from_pairs(options, strict)?.to_file(path, source, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{progress::Silent, raster::MemRaster};

    #[test]
    fn rejects_two_bands() {
        let raster = MemRaster::new(2, 2, 2);
        let err = CreateCopy::new(CreateOptions::default())
            .write_to(&raster, Vec::new(), &mut Silent)
            .unwrap_err();
        assert!(matches!(err, GbError::InvalidSource(_)));
    }

    #[test]
    fn strict_rejects_wide_samples() {
        let raster = MemRaster::new(2, 2, 1).with_data_type(DataType::UInt16);
        let copy = CreateCopy::new(CreateOptions::default()).strict(true);
        assert!(matches!(
            copy.write_to(&raster, Vec::new(), &mut Silent),
            Err(GbError::InvalidSource(_))
        ));

        let copy = CreateCopy::new(CreateOptions::default());
        assert!(copy.write_to(&raster, Vec::new(), &mut Silent).is_ok());
    }

    #[test]
    fn cancel_before_start() {
        let raster = MemRaster::new(2, 2, 1);
        let mut cancel = |_: f64| false;
        let err = CreateCopy::new(CreateOptions::default())
            .write_to(&raster, Vec::new(), &mut cancel)
            .unwrap_err();
        assert!(matches!(err, GbError::Cancelled));
    }

    #[test]
    fn unknown_compression() {
        assert!(matches!(
            CreateCopy::from_pairs([("COMPRESS", "LZW")], true),
            Err(GbError::InvalidOption(_))
        ));
        let copy = CreateCopy::from_pairs([("compress", "LZW")], false).unwrap();
        assert_eq!(copy.options().compression, crate::options::Compression::Deflate);
    }
}
