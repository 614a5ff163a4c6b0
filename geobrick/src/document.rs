//! Streaming PDF writer.
//!
//! Objects are written as soon as their content is known and never revisited.
//! Object numbers are handed out by the [`XrefTable`], the offsets of written
//! objects are recorded there and emitted as cross reference section on
//! [`DocumentWriter::close`].
//!
//! A writer either starts a new document or appends an incremental update to
//! a document this crate wrote before. The update keeps every old byte and
//! chains the new cross reference section to the previous one with `/Prev`.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::{
    error::{GbError, Result},
    geo::{ogc_bp, GeoContext, Iso32000},
    image::EncoderRegistry,
    options::{CreateOptions, GeoEncoding, InfoOptions, Margins, UpdateOptions},
    page::{self, GeoLinks, PageContext},
    parse::{self, error::GbParseErrorKind, trailer},
    pdf::{
        dict,
        document::{dict_types, K_LGIDICT, K_METADATA, K_VP},
        trailer::TrailerState,
        Dictionary, Object, ObjectId, Trailer, XrefTable,
    },
    raster::RasterSource,
    simple_encode::{
        section::{write_startxref, XrefSection},
        SimpleEncoder,
    },
    srs::{SpatialRefService, WktSpatialRefService},
    writer::Encoder,
};

use self::stream::OutputStream;

mod imagery;
mod stream;

/// Version line followed by a comment of 4 non ASCII bytes marking the file
/// as binary.
const HEADER: &[u8] = b"%PDF-1.6\n%\xFF\xFF\xFF\xFF\n";

pub struct DocumentWriter<W: Write> {
    out: OutputStream<W>,
    xref: XrefTable,
    state: TrailerState,
    /// The `Pages` object. Only new documents have one.
    page_root: Option<ObjectId>,
    open_object: Option<ObjectId>,
    page_ids: Vec<ObjectId>,
    layer_ids: Vec<ObjectId>,
    page: Option<PageContext>,
    color_table: Option<ObjectId>,
    encoders: EncoderRegistry,
    srs: Box<dyn SpatialRefService>,
    closed: bool,
}

impl<W: Write> DocumentWriter<W> {
    fn with_state(inner: W, position: u64, state: TrailerState) -> Self {
        Self {
            out: OutputStream::new(inner, position),
            xref: XrefTable::new(),
            state,
            page_root: None,
            open_object: None,
            page_ids: Vec::new(),
            layer_ids: Vec::new(),
            page: None,
            color_table: None,
            encoders: EncoderRegistry::default(),
            srs: Box::new(WktSpatialRefService),
            closed: false,
        }
    }

    /// Start a new document on `inner`. Objects 1 and 2 are reserved for the
    /// page tree root and the catalog.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = Self::with_state(inner, 0, TrailerState::default());
        writer.out.write_all(HEADER)?;
        writer.page_root = Some(writer.xref.allocate());
        writer.state.catalog = Some(writer.xref.allocate());
        Ok(writer)
    }

    pub fn with_encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn with_srs(mut self, srs: Box<dyn SpatialRefService>) -> Self {
        self.srs = srs;
        self
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    pub fn catalog(&self) -> Option<ObjectId> {
        self.state.catalog
    }

    pub fn info(&self) -> Option<ObjectId> {
        self.state.info
    }

    pub fn xmp(&self) -> Option<ObjectId> {
        self.state.xmp
    }

    fn start_obj(&mut self, id: ObjectId) -> Result<()> {
        assert!(
            self.open_object.is_none(),
            "object {} started while {:?} is open",
            id,
            self.open_object
        );
        self.xref.record(id, self.out.position());
        writeln!(self.out, "{} {} obj", id.number, id.generation)?;
        self.open_object = Some(id);
        Ok(())
    }

    fn end_obj(&mut self) -> Result<()> {
        assert!(self.open_object.is_some(), "no object open");
        self.out.write_all(b"endobj\n")?;
        self.open_object = None;
        Ok(())
    }

    fn write_dict(&mut self, d: &Dictionary) -> Result<()> {
        let mut buf = SimpleEncoder::to_vec(d);
        buf.push(b'\n');
        self.out.write_all(&buf)?;
        Ok(())
    }

    /// Write `d` as the complete content of object `id`.
    fn write_object(&mut self, id: ObjectId, d: &Dictionary) -> Result<()> {
        self.start_obj(id)?;
        self.write_dict(d)?;
        self.end_obj()
    }

    /// The indirect length object of a stream written before.
    fn write_length(&mut self, id: ObjectId, length: u64) -> Result<()> {
        self.start_obj(id)?;
        writeln!(self.out, "   {}", length)?;
        self.end_obj()
    }

    /// Write the document information dictionary.
    ///
    /// Every entry comes from `info` or, if not given there, from the
    /// metadata item of the same name. Empty values count as absent. Nothing
    /// is written if all entries are absent.
    pub fn set_info(&mut self, raster: &dyn RasterSource, info: &InfoOptions) -> Result<Option<ObjectId>> {
        let mut d = Dictionary::default();
        for (key, item, value) in info.entries() {
            let value = match value {
                Some(v) => Some(v),
                None => raster.metadata_item(item),
            };
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                d.insert(key.into(), Object::text(v));
            }
        }
        if d.is_empty() {
            return Ok(None);
        }

        let id = match self.state.info {
            Some(id) => id,
            None => {
                let id = self.xref.allocate();
                self.state.info = Some(id);
                id
            }
        };
        log::debug!("write document information as {}", id);
        self.write_object(id, &d)?;
        Ok(Some(id))
    }

    /// Write the XMP metadata stream.
    ///
    /// `xmp` overrides the packet of the raster. A value starting with `NO`,
    /// or an empty one, suppresses the metadata. Packets that are not well
    /// formed XML are dropped.
    pub fn set_xmp(&mut self, raster: &dyn RasterSource, xmp: Option<&str>) -> Result<Option<ObjectId>> {
        let packet = match xmp {
            Some(v) if v.is_empty() || v.get(..2).map_or(false, |p| p.eq_ignore_ascii_case("NO")) => return Ok(None),
            Some(v) => v,
            None => match raster.xmp() {
                Some(v) => v,
                None => return Ok(None),
            },
        };
        if let Err(e) = roxmltree::Document::parse(packet) {
            log::warn!("XMP metadata is not valid XML, skipping it: {}", e);
            return Ok(None);
        }

        let id = match self.state.xmp {
            Some(id) => id,
            None => {
                let id = self.xref.allocate();
                self.state.xmp = Some(id);
                id
            }
        };
        self.start_obj(id)?;
        self.write_dict(&dict([
            ("Type", Object::name(dict_types::METADATA)),
            ("Subtype", Object::name("XML")),
            ("Length", packet.len().into()),
        ]))?;
        self.out.write_all(b"stream\n")?;
        self.out.write_all(packet.as_bytes())?;
        self.out.write_all(b"\nendstream\n")?;
        self.end_obj()?;
        Ok(Some(id))
    }

    /// An optional content group named `name`, registered as document layer.
    fn write_ocg(&mut self, name: Option<&str>) -> Result<Option<ObjectId>> {
        let name = match name.filter(|n| !n.is_empty()) {
            Some(n) => n,
            None => return Ok(None),
        };
        let id = self.xref.allocate();
        self.layer_ids.push(id);
        self.write_object(id, &page::ocg(name))?;
        Ok(Some(id))
    }

    /// Allocate and write the georeferencing objects computed before.
    fn write_georeferencing(&mut self, iso: Option<Iso32000>, lgi_dict: Option<Dictionary>) -> Result<GeoLinks> {
        let mut links = GeoLinks::default();
        if let Some(iso) = iso {
            let viewport = self.xref.allocate();
            let measure = self.xref.allocate();
            let gcs = self.xref.allocate();
            self.write_object(viewport, &iso.viewport(measure))?;
            self.write_object(measure, &iso.measure(gcs))?;
            self.write_object(gcs, &iso.gcs())?;
            links.viewport = Some(viewport);
        }
        if let Some(lgi_dict) = lgi_dict {
            let id = self.xref.allocate();
            self.write_object(id, &lgi_dict)?;
            links.lgi_dict = Some(id);
        }
        Ok(links)
    }

    /// Begin the page of `raster`: the page dictionary and its
    /// georeferencing. Content and resources follow in
    /// [`end_page`](Self::end_page).
    pub fn start_page(&mut self, raster: &dyn RasterSource, options: &CreateOptions) -> Result<ObjectId> {
        let root = self
            .page_root
            .ok_or_else(|| GbError::NotSupported("pages can only be added to a new document".to_owned()))?;
        if self.page.is_some() {
            return Err(GbError::NotSupported("previous page was not ended".to_owned()));
        }

        let page_id = self.xref.allocate();
        self.page_ids.push(page_id);
        let content = self.xref.allocate();
        let resources = self.xref.allocate();

        let user_unit = options.dpi / 72.0;
        let (iso, lgi_dict) = georeferencing(
            &GeoContext {
                raster,
                srs: self.srs.as_ref(),
                user_unit,
                neatline: options.neatline.as_deref(),
                margins: options.margins,
                write_wkt: options.ogc_bp_write_wkt,
            },
            options.geo_encoding,
        );
        let geo = self.write_georeferencing(iso, lgi_dict)?;

        let page = PageContext {
            content,
            resources,
            width: raster.width(),
            height: raster.height(),
            user_unit,
            margins: options.margins,
            images: Vec::new(),
        };
        self.write_object(page_id, &page::page_dict(root, &page, raster.band_count(), geo))?;
        self.page = Some(page);
        log::debug!("started page {}", page_id);
        Ok(page_id)
    }

    /// Finish the current page: its layers, content stream and resources.
    pub fn end_page(
        &mut self,
        layer_name: Option<&str>,
        extra_content: Option<&str>,
        extra_layer_name: Option<&str>,
    ) -> Result<()> {
        let page = self
            .page
            .take()
            .ok_or_else(|| GbError::NotSupported("no page started".to_owned()))?;

        let extra_layer = self.write_ocg(extra_layer_name)?;
        let raster_layer = self.write_ocg(layer_name)?;

        let length_id = self.xref.allocate();
        let body = page::content_stream(&page.images, raster_layer, extra_content, extra_layer);
        self.start_obj(page.content)?;
        self.write_dict(&dict([("Length", length_id.into())]))?;
        self.out.write_all(b"stream\n")?;
        self.out.write_all(&body)?;
        self.out.write_all(b"endstream\n")?;
        self.end_obj()?;
        self.write_length(length_id, body.len() as u64)?;

        let resources = page::resources(&page.images, extra_content, &self.layer_ids);
        self.write_object(page.resources, &resources)
    }

    fn write_pages(&mut self, root: ObjectId) -> Result<()> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        self.write_object(
            root,
            &dict([
                ("Type", Object::name(dict_types::PAGES)),
                ("Count", self.page_ids.len().into()),
                ("Kids", kids.into()),
            ]),
        )?;

        let catalog_id = self.catalog_id()?;
        let mut catalog = dict([("Type", Object::name(dict_types::CATALOG)), ("Pages", root.into())]);
        if let Some(xmp) = self.state.xmp {
            catalog.insert(K_METADATA.into(), xmp.into());
        }
        if !self.layer_ids.is_empty() {
            let layers = || Object::from(self.layer_ids.iter().map(|id| Object::from(*id)).collect::<Vec<_>>());
            catalog.insert(
                "OCProperties".into(),
                dict([("D", dict([("Order", layers())]).into()), ("OCGs", layers())]).into(),
            );
        }
        self.write_object(catalog_id, &catalog)
    }

    fn catalog_id(&self) -> Result<ObjectId> {
        self.state
            .catalog
            .ok_or(GbError::MalformedTrailer("no catalog to reference"))
    }

    fn write_xref_and_trailer(&mut self) -> Result<()> {
        let incremental = self.state.can_update;
        if !incremental {
            let unwritten: Vec<ObjectId> = self.xref.unwritten().collect();
            assert!(unwritten.is_empty(), "objects {:?} were allocated but never written", unwritten);
        }

        let offset = self.out.position();
        let mut buf = SimpleEncoder::to_vec(&XrefSection {
            table: &self.xref,
            incremental,
        });
        let trailer = Trailer {
            size: self.xref.len() + 1,
            previous: Some(self.state.last_start_xref).filter(|prev| *prev != 0),
            root: self.catalog_id()?,
            info: self.state.info,
        };
        SimpleEncoder::write_to(&trailer, &mut buf);
        write_startxref(offset, &mut buf);
        self.out.write_all(&buf)?;
        log::debug!("cross reference section of {} entries at {}", self.xref.len(), offset);
        Ok(())
    }

    /// Write the page tree, catalog and cross reference section. An update
    /// that wrote nothing leaves the file untouched. Closing twice is a
    /// no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        assert!(self.open_object.is_none(), "closing with object {:?} open", self.open_object);
        if let Some(root) = self.page_root {
            self.write_pages(root)?;
            self.write_xref_and_trailer()?;
        } else if self.state.can_update {
            self.write_xref_and_trailer()?;
        }
        self.out.flush()?;
        self.closed = true;
        Ok(())
    }

    /// Close the document and hand back the underlying stream.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        Ok(self.out.into_inner()?)
    }
}

impl<W: Read + Write + Seek> DocumentWriter<W> {
    /// Continue a document this crate wrote before. New objects are numbered
    /// after the old ones, the old trailer is kept as `/Prev`.
    pub fn open_append(mut inner: W) -> Result<Self> {
        let state = trailer::recover(&mut inner)?;
        let position = inner.stream_position()?;
        log::debug!(
            "appending at {}, previous xref at {} with {} entries",
            position,
            state.last_start_xref,
            state.last_xref_size
        );
        let mut writer = Self::with_state(inner, position, state);
        writer.xref.resize(state.last_xref_size.saturating_sub(1));
        Ok(writer)
    }

    fn begin_update(&mut self) {
        self.state.can_update = true;
    }

    /// Read the dictionary of object `id` as found in the previous revision.
    fn read_dictionary(&mut self, id: ObjectId) -> Result<Dictionary> {
        let start_xref = self.state.last_start_xref;
        let inner = self.out.get_mut()?;
        let found = parse::read_object(&mut *inner, start_xref, id);
        inner.seek(SeekFrom::End(0))?;
        match found? {
            Object::Dictionary(d) => Ok(d),
            _ => Err(GbError::Parse(GbParseErrorKind::UnexpectedObject)),
        }
    }

    /// Replace the document information. If there is nothing left to write,
    /// the old dictionary is overwritten by an empty one.
    pub fn update_info(&mut self, raster: &dyn RasterSource, info: &InfoOptions) -> Result<()> {
        self.begin_update();
        let old = self.state.info;
        if self.set_info(raster, info)?.is_none() {
            if let Some(old) = old {
                self.write_object(old, &Dictionary::default())?;
            }
        }
        Ok(())
    }

    /// Replace the XMP metadata of the document by the packet of `raster`
    /// and rewrite the catalog to point at it.
    pub fn update_xmp(&mut self, raster: &dyn RasterSource) -> Result<()> {
        self.begin_update();
        let catalog_id = self.catalog_id()?;
        let mut catalog = self.read_dictionary(catalog_id)?;

        if let Some(old) = catalog.get(K_METADATA).and_then(Object::reference) {
            self.state.xmp = Some(old);
        }
        catalog.shift_remove(K_METADATA);

        if self.set_xmp(raster, None)?.is_none() {
            if let Some(old) = self.state.xmp {
                self.write_object(old, &Dictionary::default())?;
            }
        }
        if let Some(xmp) = self.state.xmp {
            catalog.insert(K_METADATA.into(), xmp.into());
        }
        self.write_object(catalog_id, &catalog)
    }

    /// Replace the georeferencing of page `page_id` by the one of `raster`.
    pub fn update_georeferencing(
        &mut self,
        raster: &dyn RasterSource,
        dpi: f64,
        page_id: ObjectId,
        options: UpdateOptions,
    ) -> Result<()> {
        self.begin_update();
        let mut page = self.read_dictionary(page_id)?;

        let (iso, lgi_dict) = georeferencing(
            &GeoContext {
                raster,
                srs: self.srs.as_ref(),
                user_unit: dpi / 72.0,
                neatline: None,
                margins: Margins::default(),
                write_wkt: options.write_wkt,
            },
            options.geo_encoding,
        );
        let geo = self.write_georeferencing(iso, lgi_dict)?;

        page.shift_remove(K_VP);
        page.shift_remove(K_LGIDICT);
        if let Some(viewport) = geo.viewport {
            page.insert(K_VP.into(), vec![Object::from(viewport)].into());
        }
        if let Some(lgi_dict) = geo.lgi_dict {
            page.insert(K_LGIDICT.into(), lgi_dict.into());
        }
        self.write_object(page_id, &page)
    }
}

/// Georeferencing of `ctx` in the conventions selected by `encoding`.
fn georeferencing(ctx: &GeoContext, encoding: GeoEncoding) -> (Option<Iso32000>, Option<Dictionary>) {
    let iso = if encoding.iso32000() {
        Iso32000::compute(ctx)
    } else {
        None
    };
    let lgi_dict = if encoding.ogc_bp() { ogc_bp::lgi_dict(ctx) } else { None };
    (iso, lgi_dict)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        pdf::Name,
        raster::{GeoTransform, MemRaster},
        srs::wkt::tests::WGS84,
    };

    const XMP: &str = "<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"><rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"/></x:xmpmeta>";

    fn read(file: &[u8], id: ObjectId) -> Dictionary {
        let mut cursor = Cursor::new(file);
        let state = trailer::recover(&mut cursor).unwrap();
        match parse::read_object(&mut cursor, state.last_start_xref, id).unwrap() {
            Object::Dictionary(d) => d,
            other => panic!("expected a dictionary, got {:?}", other),
        }
    }

    fn keys(d: &Dictionary) -> Vec<String> {
        d.keys().map(Name::to_string).collect()
    }

    fn text(d: &Dictionary, key: &str) -> Option<String> {
        d.get(key.as_bytes())
            .and_then(Object::string)
            .map(|s| String::from_utf8_lossy(s).into_owned())
    }

    #[test]
    fn empty_document() {
        let file = DocumentWriter::new(Vec::new()).unwrap().into_inner().unwrap();
        assert!(file.starts_with(HEADER));
        assert!(file.ends_with(b"%%EOF\n"));

        let catalog = read(&file, ObjectId::new(2, 0));
        assert_eq!(catalog.get(b"Type".as_ref()), Some(&Object::name("Catalog")));
        assert_eq!(catalog.get(b"Pages".as_ref()), Some(&Object::from(ObjectId::new(1, 0))));
        let pages = read(&file, ObjectId::new(1, 0));
        assert_eq!(pages.get(b"Count".as_ref()), Some(&Object::from(0)));
    }

    #[test]
    fn close_twice() {
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        writer.close().unwrap();
        let len = writer.out.position();
        writer.close().unwrap();
        assert_eq!(writer.out.position(), len);
    }

    #[test]
    fn info_from_options_and_metadata() {
        let raster = MemRaster::new(2, 2, 1)
            .with_metadata("AUTHOR", "metadata author")
            .with_metadata("TITLE", "metadata title")
            .with_metadata("SUBJECT", "");
        let info = InfoOptions {
            producer: Some("geobrick".to_owned()),
            title: Some(String::new()),
            ..InfoOptions::default()
        };
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        let id = writer.set_info(&raster, &info).unwrap().unwrap();
        assert_eq!(id, ObjectId::new(3, 0));
        let file = writer.into_inner().unwrap();

        let d = read(&file, id);
        assert_eq!(keys(&d), vec!["Author", "Producer"]);
        assert_eq!(text(&d, "Author").as_deref(), Some("metadata author"));
    }

    #[test]
    fn no_info_without_entries() {
        let raster = MemRaster::new(2, 2, 1);
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        assert_eq!(writer.set_info(&raster, &InfoOptions::default()).unwrap(), None);
        assert_eq!(writer.xref.len(), 2);
    }

    #[test]
    fn xmp_selection() {
        let raster = MemRaster::new(2, 2, 1).with_xmp(XMP);
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        assert_eq!(writer.set_xmp(&raster, Some("NONE")).unwrap(), None);
        assert_eq!(writer.set_xmp(&raster, Some("")).unwrap(), None);
        assert_eq!(writer.set_xmp(&raster, Some("<unclosed>")).unwrap(), None);
        assert_eq!(writer.xref.len(), 2);

        let id = writer.set_xmp(&raster, None).unwrap().unwrap();
        let file = writer.into_inner().unwrap();
        let needle = format!("stream\n{}\nendstream\n", XMP);
        assert!(file.windows(needle.len()).any(|w| w == needle.as_bytes()));
        let catalog = read(&file, ObjectId::new(2, 0));
        assert_eq!(catalog.get(K_METADATA), Some(&Object::from(id)));
    }

    #[test]
    fn layers_in_catalog() {
        let raster = MemRaster::new(4, 2, 1).fill(1, 9);
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        let options = CreateOptions {
            geo_encoding: GeoEncoding::None,
            ..CreateOptions::default()
        };
        writer.start_page(&raster, &options).unwrap();
        writer.write_imagery(&raster, &options, &mut crate::progress::Silent).unwrap();
        writer
            .end_page(Some("Raster"), Some("BT /FTimesRoman 10 Tf ET"), Some("Notes"))
            .unwrap();
        let file = writer.into_inner().unwrap();

        let catalog = read(&file, ObjectId::new(2, 0));
        let oc = catalog.get(b"OCProperties".as_ref()).and_then(Object::dictionary).unwrap();
        let ocgs = oc.get(b"OCGs".as_ref()).and_then(Object::array).unwrap();
        // the extra content layer is written first
        let names: Vec<_> = ocgs
            .iter()
            .map(|layer| text(&read(&file, layer.reference().unwrap()), "Name").unwrap())
            .collect();
        assert_eq!(names, vec!["Notes", "Raster"]);
    }

    #[test]
    fn update_info_and_xmp() {
        let raster = MemRaster::new(2, 2, 1).with_metadata("TITLE", "first").with_xmp(XMP);
        let mut writer = DocumentWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.set_info(&raster, &InfoOptions::default()).unwrap();
        writer.set_xmp(&raster, None).unwrap();
        let mut file = writer.into_inner().unwrap();
        let first_len = file.get_ref().len();

        let updated = MemRaster::new(2, 2, 1).with_metadata("TITLE", "second");
        let mut writer = DocumentWriter::open_append(&mut file).unwrap();
        writer.update_info(&updated, &InfoOptions::default()).unwrap();
        writer.update_xmp(&updated).unwrap();
        writer.close().unwrap();
        drop(writer);

        let file = file.into_inner();
        assert!(file.len() > first_len);
        let info = read(&file, ObjectId::new(3, 0));
        assert_eq!(text(&info, "Title").as_deref(), Some("second"));
        // the XMP object is emptied but stays referenced
        let xmp = read(&file, ObjectId::new(4, 0));
        assert!(xmp.is_empty());
        let catalog = read(&file, ObjectId::new(2, 0));
        assert_eq!(catalog.get(K_METADATA), Some(&Object::from(ObjectId::new(4, 0))));
        assert_eq!(catalog.get(b"Pages".as_ref()), Some(&Object::from(ObjectId::new(1, 0))));

        let tail = String::from_utf8_lossy(&file[first_len..]);
        assert!(tail.contains("/Prev "));
        assert!(tail.contains("xref\n0 1\n0000000000 65535 f \n2 3\n"));
    }

    #[test]
    fn update_without_changes_leaves_file_alone() {
        let mut file = DocumentWriter::new(Cursor::new(Vec::new())).unwrap().into_inner().unwrap();
        let len = file.get_ref().len();
        DocumentWriter::open_append(&mut file).unwrap().into_inner().unwrap();
        assert_eq!(file.get_ref().len(), len);
    }

    #[test]
    fn open_append_continues_numbering() {
        let raster = MemRaster::new(2, 2, 1).with_metadata("TITLE", "first");
        let mut writer = DocumentWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.set_info(&raster, &InfoOptions::default()).unwrap();
        let mut file = writer.into_inner().unwrap();
        let len = file.get_ref().len();

        let mut writer = DocumentWriter::open_append(&mut file).unwrap();
        assert_eq!(writer.xref.len(), 3);
        assert!(!writer.state.can_update);
        writer.close().unwrap();
        drop(writer);
        assert_eq!(file.get_ref().len(), len);

        let mut writer = DocumentWriter::open_append(&mut file).unwrap();
        writer.update_xmp(&raster.clone().with_xmp(XMP)).unwrap();
        assert_eq!(writer.xmp(), Some(ObjectId::new(4, 0)));
        writer.close().unwrap();
        drop(writer);

        let tail = String::from_utf8_lossy(&file.get_ref()[len..]);
        assert!(tail.contains("/Size 5 "), "{}", tail);
    }

    #[test]
    #[should_panic(expected = "never written")]
    fn close_with_open_page_panics() {
        let raster = MemRaster::new(2, 2, 1);
        let mut writer = DocumentWriter::new(Vec::new()).unwrap();
        writer.start_page(&raster, &CreateOptions::default()).unwrap();
        let _ = writer.close();
    }

    #[test]
    fn update_georeferencing_replaces_viewport() {
        let raster = MemRaster::new(10, 10, 1).with_geo_transform(GeoTransform([2.0, 0.1, 0.0, 49.0, 0.0, -0.1]), WGS84);
        let options = CreateOptions {
            geo_encoding: GeoEncoding::None,
            ..CreateOptions::default()
        };
        let mut writer = DocumentWriter::new(Cursor::new(Vec::new())).unwrap();
        let page_id = writer.start_page(&raster, &options).unwrap();
        writer.write_imagery(&raster, &options, &mut crate::progress::Silent).unwrap();
        writer.end_page(None, None, None).unwrap();
        let mut file = writer.into_inner().unwrap();
        assert!(read(file.get_ref(), page_id).get(K_VP).is_none());

        let mut writer = DocumentWriter::open_append(&mut file).unwrap();
        writer
            .update_georeferencing(&raster, 72.0, page_id, UpdateOptions::default().with_geo_encoding(GeoEncoding::Both))
            .unwrap();
        writer.close().unwrap();
        drop(writer);

        let page = read(file.get_ref(), page_id);
        assert!(page.get(K_VP).and_then(Object::array).is_some());
        let lgi = page.get(K_LGIDICT).and_then(Object::reference).unwrap();
        assert_eq!(
            read(file.get_ref(), lgi).get(b"Type".as_ref()),
            Some(&Object::name("LGIDict"))
        );
        assert_eq!(page.get(b"Type".as_ref()), Some(&Object::name("Page")));
    }
}
