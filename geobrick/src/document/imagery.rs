//! Image XObjects: the palette, soft masks and the raster blocks of a page.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression as Level};

use super::DocumentWriter;
use crate::{
    error::{GbError, Result},
    image::{horizontal_difference, BlockImage, Mask},
    options::{Compression, CreateOptions},
    pdf::{dict, document::dict_types, Dictionary, Object, ObjectId},
    progress::{Progress, Scaled},
    raster::{RasterSource, Window},
    simple_encode::SimpleEncoder,
    writer::Encoder,
};

/// Largest palette an indexed color space can hold.
const MAX_PALETTE: usize = 256;

impl<W: Write> DocumentWriter<W> {
    /// Write `d` and a stream filled by `body` as object `id`, followed by the
    /// length object `length_id`.
    ///
    /// The stream and both objects are completed even if `body` fails, its
    /// error is returned afterwards.
    fn write_stream_object<F>(&mut self, id: ObjectId, length_id: ObjectId, d: &Dictionary, deflate: bool, body: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        self.start_obj(id)?;
        self.write_dict(d)?;
        self.out.write_all(b"stream\n")?;
        let start = self.out.position();

        let result = if deflate {
            let mut encoder = ZlibEncoder::new(&mut self.out, Level::default());
            let result = body(&mut encoder);
            let finished = encoder.finish().map(|_| ()).map_err(GbError::from);
            result.and(finished)
        } else {
            body(&mut self.out)
        };

        let length = self.out.position() - start;
        self.out.write_all(b"\nendstream\n")?;
        self.end_obj()?;
        self.write_length(length_id, length)?;
        result
    }

    /// The indexed color space of a palette raster, written once per
    /// document. Palettes of more than 256 entries are not representable.
    fn write_color_table(&mut self, raster: &dyn RasterSource) -> Result<Option<ObjectId>> {
        if self.color_table.is_some() {
            return Ok(self.color_table);
        }
        let entries = match raster.color_table() {
            Some(entries) if !entries.is_empty() && entries.len() <= MAX_PALETTE => entries,
            Some(entries) if entries.len() > MAX_PALETTE => {
                log::warn!("color table of {} entries ignored", entries.len());
                return Ok(None);
            }
            _ => return Ok(None),
        };

        let color_space = self.xref.allocate();
        let lookup = self.xref.allocate();

        self.start_obj(color_space)?;
        let indexed: Object = vec![
            Object::name("Indexed"),
            vec![Object::name("DeviceRGB")].into(),
            (entries.len() - 1).into(),
            lookup.into(),
        ]
        .into();
        let mut buf = SimpleEncoder::to_vec(&indexed);
        buf.push(b'\n');
        self.out.write_all(&buf)?;
        self.end_obj()?;

        let table: Vec<u8> = entries.iter().flat_map(|e| [e.c1, e.c2, e.c3]).collect();
        self.start_obj(lookup)?;
        let mut buf = SimpleEncoder::to_vec(&dict([("Length", table.len().into())]));
        buf.extend_from_slice(b" % Lookup table\nstream\n");
        self.out.write_all(&buf)?;
        self.out.write_all(&table)?;
        self.out.write_all(b"\nendstream\n")?;
        self.end_obj()?;

        self.color_table = Some(color_space);
        Ok(self.color_table)
    }

    /// Soft mask of `window` from band 4. Fully opaque blocks get none.
    fn write_mask(&mut self, raster: &dyn RasterSource, window: Window, compression: Compression) -> Result<Option<ObjectId>> {
        let mut alpha = vec![0u8; window.len()];
        raster.read_band(4, window, &mut alpha)?;
        let mask = Mask::from_alpha(alpha, window.width, window.height);
        if mask == Mask::Opaque {
            return Ok(None);
        }

        let id = self.xref.allocate();
        let length_id = self.xref.allocate();
        let deflate = compression != Compression::None;

        let mut d = dict([
            ("Length", length_id.into()),
            ("Type", Object::name(dict_types::XOBJECT)),
        ]);
        if deflate {
            d.insert("Filter".into(), Object::name("FlateDecode"));
        }
        d.insert("Subtype".into(), Object::name("Image"));
        d.insert("Width".into(), window.width.into());
        d.insert("Height".into(), window.height.into());
        d.insert("ColorSpace".into(), Object::name("DeviceGray"));
        d.insert("BitsPerComponent".into(), i64::from(mask.bits_per_component()).into());

        self.write_stream_object(id, length_id, &d, deflate, |out| Ok(out.write_all(mask.data())?))?;
        Ok(Some(id))
    }

    /// One image XObject holding `window` of `raster`, preceded by its soft
    /// mask for 4 band rasters.
    fn write_block(
        &mut self,
        raster: &dyn RasterSource,
        window: Window,
        color_table: Option<ObjectId>,
        options: &CreateOptions,
        progress: &mut dyn Progress,
    ) -> Result<ObjectId> {
        let mask = if raster.band_count() == 4 {
            self.write_mask(raster, window, options.compression)?
        } else {
            None
        };
        let bands = raster.band_count().min(3);
        let predictor = options.compression == Compression::Deflate && options.predictor == 2;

        let encoded = if options.compression.is_lossy() {
            let mut data = vec![0u8; window.len() * bands];
            raster.read_interleaved(bands, window, &mut data)?;
            let (encoder, encoder_options) = self.encoders.resolve(
                options.compression,
                options.jpeg_quality,
                options.jpeg2000_driver.as_deref(),
            )?;
            let block = BlockImage {
                width: window.width,
                height: window.height,
                bands,
                data: &data,
            };
            Some(encoder.encode(&block, &encoder_options)?)
        } else {
            None
        };

        let id = self.xref.allocate();
        let length_id = self.xref.allocate();

        let mut d = dict([
            ("Length", length_id.into()),
            ("Type", Object::name(dict_types::XOBJECT)),
        ]);
        let filter = match options.compression {
            Compression::None => None,
            Compression::Deflate => Some("FlateDecode"),
            Compression::Jpeg => Some("DCTDecode"),
            Compression::Jpeg2000 => Some("JPXDecode"),
        };
        if let Some(filter) = filter {
            d.insert("Filter".into(), Object::name(filter));
        }
        if predictor {
            let params = dict([
                ("Predictor", 2.into()),
                ("Colors", bands.into()),
                ("Columns", window.width.into()),
            ]);
            d.insert("DecodeParms".into(), params.into());
        }
        d.insert("Subtype".into(), Object::name("Image"));
        d.insert("Width".into(), window.width.into());
        d.insert("Height".into(), window.height.into());
        let color_space = match (color_table, bands) {
            (Some(table), _) => table.into(),
            (None, 1) => Object::name("DeviceGray"),
            (None, _) => Object::name("DeviceRGB"),
        };
        d.insert("ColorSpace".into(), color_space);
        d.insert("BitsPerComponent".into(), 8.into());
        if let Some(mask) = mask {
            d.insert("SMask".into(), mask.into());
        }

        let deflate = options.compression == Compression::Deflate;
        self.write_stream_object(id, length_id, &d, deflate, |out| {
            if let Some(encoded) = &encoded {
                out.write_all(encoded)?;
                return if progress.report(1.0) {
                    Ok(())
                } else {
                    Err(GbError::Cancelled)
                };
            }

            let mut line = vec![0u8; window.width * bands];
            for row in 0..window.height {
                raster.read_interleaved(bands, Window::new(window.x, window.y + row, window.width, 1), &mut line)?;
                if predictor {
                    horizontal_difference(&mut line, bands);
                }
                out.write_all(&line)?;
                if !progress.report((row + 1) as f64 / window.height as f64) {
                    return Err(GbError::Cancelled);
                }
            }
            Ok(())
        })?;
        Ok(id)
    }

    /// Write the raster of the current page as a grid of image blocks in
    /// row major order. Progress of block `i` out of `n` runs from `i / n`
    /// to `(i + 1) / n`.
    pub fn write_imagery(
        &mut self,
        raster: &dyn RasterSource,
        options: &CreateOptions,
        progress: &mut dyn Progress,
    ) -> Result<()> {
        if self.page.is_none() {
            return Err(GbError::NotSupported("no page started".to_owned()));
        }
        if options.compression.is_lossy() {
            // fail before the first object if no encoder is available
            self.encoders.resolve(
                options.compression,
                options.jpeg_quality,
                options.jpeg2000_driver.as_deref(),
            )?;
        }

        let color_table = self.write_color_table(raster)?;

        let (width, height) = (raster.width(), raster.height());
        let (block_width, block_height) = options.block_size(width, height);
        let x_blocks = (width + block_width - 1) / block_width;
        let y_blocks = (height + block_height - 1) / block_height;
        let blocks = (x_blocks * y_blocks) as f64;
        log::debug!(
            "writing {}x{} raster as {} blocks of {}x{}",
            width,
            height,
            x_blocks * y_blocks,
            block_width,
            block_height
        );

        for block_y in 0..y_blocks {
            for block_x in 0..x_blocks {
                let x = block_x * block_width;
                let y = block_y * block_height;
                let window = Window::new(x, y, block_width.min(width - x), block_height.min(height - y));
                let index = (block_y * x_blocks + block_x) as f64;

                let mut scaled = Scaled::new(&mut *progress, index / blocks, (index + 1.0) / blocks);
                let image = self.write_block(raster, window, color_table, options, &mut scaled)?;
                if let Some(page) = self.page.as_mut() {
                    page.place(image, window.x, window.y, window.width, window.height);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use flate2::read::ZlibDecoder;

    use super::*;
    use crate::{
        options::GeoEncoding,
        parse::{self, object::indirect_object, span, trailer},
        pdf::Name,
        progress::Silent,
        raster::{ColorEntry, MemRaster},
    };

    fn options(compression: Compression) -> CreateOptions {
        CreateOptions {
            compression,
            geo_encoding: GeoEncoding::None,
            ..CreateOptions::default()
        }
    }

    fn write(raster: &MemRaster, options: &CreateOptions) -> Vec<u8> {
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        writer.start_page(raster, options).unwrap();
        writer.write_imagery(raster, options, &mut Silent).unwrap();
        writer.end_page(None, None, None).unwrap();
        writer.into_inner().unwrap()
    }

    /// Dictionary and stream bytes of object `number`.
    fn stream_object(file: &[u8], number: u32) -> (Dictionary, Vec<u8>) {
        let mut cursor = Cursor::new(file);
        let state = trailer::recover(&mut cursor).unwrap();
        let offset = parse::find_object_offset(&mut cursor, state.last_start_xref, number)
            .unwrap()
            .unwrap() as usize;
        let (_, found) = indirect_object(span(&file[offset..])).unwrap();
        let d = match found.object {
            Object::Dictionary(d) => d,
            other => panic!("expected a dictionary, got {:?}", other),
        };
        let length_id = d.get(b"Length".as_ref()).and_then(Object::reference).unwrap();
        let length_offset = parse::find_object_offset(&mut cursor, state.last_start_xref, length_id.number)
            .unwrap()
            .unwrap() as usize;
        let (_, length) = indirect_object(span(&file[length_offset..])).unwrap();
        let length = length.object.integer().unwrap() as usize;

        let start = offset + found.stream_offset.unwrap();
        (d, file[start..start + length].to_vec())
    }

    fn keys(d: &Dictionary) -> Vec<String> {
        d.keys().map(Name::to_string).collect()
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn uncompressed_gray_block() {
        let raster = MemRaster::from_bands(3, 2, vec![vec![1, 2, 3, 4, 5, 6]]).unwrap();
        let file = write(&raster, &options(Compression::None));
        // 1 pages, 2 catalog, 3 page, 4 content, 5 resources, 6 image, 7 length
        let (d, data) = stream_object(&file, 6);
        assert_eq!(
            keys(&d),
            vec!["Length", "Type", "Subtype", "Width", "Height", "ColorSpace", "BitsPerComponent"]
        );
        assert_eq!(d.get(b"ColorSpace".as_ref()), Some(&Object::name("DeviceGray")));
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn deflate_with_predictor() {
        let raster = MemRaster::from_bands(3, 1, vec![vec![10, 20, 25], vec![0, 0, 0], vec![5, 5, 5]]).unwrap();
        let mut options = options(Compression::Deflate);
        options.predictor = 2;
        let file = write(&raster, &options);
        let (d, data) = stream_object(&file, 6);
        assert_eq!(
            keys(&d),
            vec![
                "Length",
                "Type",
                "Filter",
                "DecodeParms",
                "Subtype",
                "Width",
                "Height",
                "ColorSpace",
                "BitsPerComponent"
            ]
        );
        let params = d.get(b"DecodeParms".as_ref()).and_then(Object::dictionary).unwrap();
        assert_eq!(params.get(b"Colors".as_ref()), Some(&Object::from(3)));
        assert_eq!(inflate(&data), vec![10, 0, 5, 10, 0, 0, 5, 0, 0]);
    }

    #[test]
    fn blocks_in_row_major_order() {
        let raster = MemRaster::new(5, 3, 1).fill(1, 7);
        let mut options = options(Compression::None);
        options.block_x_size = Some(2);
        options.block_y_size = Some(2);

        let mut seen = Vec::new();
        let mut progress = |p: f64| {
            seen.push(p);
            true
        };
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        writer.start_page(&raster, &options).unwrap();
        writer.write_imagery(&raster, &options, &mut progress).unwrap();
        let origins: Vec<_> = writer.page.as_ref().unwrap().images.iter().map(|i| (i.x, i.y)).collect();
        // top row of blocks is drawn highest on the page
        assert_eq!(origins, vec![(0.0, 1.0), (2.0, 1.0), (4.0, 1.0), (0.0, 0.0), (2.0, 0.0), (4.0, 0.0)]);
        assert_eq!(seen.len(), 9);
        assert_eq!(seen.last(), Some(&1.0));
    }

    #[test]
    fn cancel_closes_stream() {
        let raster = MemRaster::new(4, 4, 1);
        let options = options(Compression::Deflate);
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        writer.start_page(&raster, &options).unwrap();
        let mut cancel = |p: f64| p < 0.5;
        let err = writer.write_imagery(&raster, &options, &mut cancel).unwrap_err();
        assert!(matches!(err, GbError::Cancelled));
        assert!(writer.open_object.is_none());
        let out = writer.out.into_inner().unwrap();
        assert!(out.ends_with(b"endobj\n"));
    }

    #[test]
    fn palette_is_indexed() {
        let raster = MemRaster::from_bands(2, 1, vec![vec![0, 1]])
            .unwrap()
            .with_color_table(vec![ColorEntry::rgb(255, 0, 0), ColorEntry::rgb(0, 0, 255)]);
        let file = write(&raster, &options(Compression::None));
        let text = String::from_utf8_lossy(&file);
        // 6 color space, 7 lookup table, 8 image
        assert!(text.contains("6 0 obj\n[ /Indexed [ /DeviceRGB ] 1 7 0 R ]\nendobj\n"));
        assert!(text.contains("7 0 obj\n<< /Length 6 >> % Lookup table\nstream\n"));
        let (d, _) = stream_object(&file, 8);
        assert_eq!(d.get(b"ColorSpace".as_ref()), Some(&Object::from(ObjectId::new(6, 0))));
    }

    #[test]
    fn alpha_band_becomes_bitmap_mask() {
        let alpha = vec![0, 255, 255, 0];
        let raster = MemRaster::from_bands(2, 2, vec![vec![9; 4], vec![8; 4], vec![7; 4], alpha]).unwrap();
        let file = write(&raster, &options(Compression::None));
        // 6 mask, 7 mask length, 8 image, 9 image length
        let (mask, data) = stream_object(&file, 6);
        assert_eq!(mask.get(b"BitsPerComponent".as_ref()), Some(&Object::from(1)));
        assert!(mask.get(b"Filter".as_ref()).is_none());
        assert_eq!(data, vec![0b0100_0000, 0b1000_0000]);

        let (image, data) = stream_object(&file, 8);
        assert_eq!(image.get(b"SMask".as_ref()), Some(&Object::from(ObjectId::new(6, 0))));
        assert_eq!(image.get(b"ColorSpace".as_ref()), Some(&Object::name("DeviceRGB")));
        assert_eq!(data, [9, 8, 7].repeat(4));
    }

    #[test]
    fn opaque_alpha_has_no_mask() {
        let raster = MemRaster::new(2, 2, 4).fill(4, 255);
        let file = write(&raster, &options(Compression::Deflate));
        let (image, _) = stream_object(&file, 6);
        assert!(image.get(b"SMask".as_ref()).is_none());
        assert_eq!(image.get(b"Width".as_ref()), Some(&Object::from(2)));
    }

    #[test]
    fn missing_jpeg2000_encoder_writes_nothing() {
        let raster = MemRaster::new(2, 2, 1);
        let options = options(Compression::Jpeg2000);
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        writer.start_page(&raster, &options).unwrap();
        let objects = writer.xref.len();
        let err = writer.write_imagery(&raster, &options, &mut Silent).unwrap_err();
        assert!(matches!(err, GbError::NotSupported(_)));
        assert_eq!(writer.xref.len(), objects);
    }

    #[test]
    fn jpeg_block_is_embedded_verbatim() {
        let raster = MemRaster::new(8, 8, 3).fill(1, 200).fill(2, 100).fill(3, 50);
        let file = write(&raster, &options(Compression::Jpeg));
        let (d, data) = stream_object(&file, 6);
        assert_eq!(d.get(b"Filter".as_ref()), Some(&Object::name("DCTDecode")));
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }
}
