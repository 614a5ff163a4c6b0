//! Page, content stream and resources of one raster page.

use crate::{
    options::Margins,
    pdf::{dict, Array, Dictionary, Name, Object, ObjectId},
    simple_encode::object::format_real,
};

/// Where one image XObject is drawn, in user space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub image: ObjectId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// State of the page between `start_page` and `end_page`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub content: ObjectId,
    pub resources: ObjectId,
    pub width: usize,
    pub height: usize,
    pub user_unit: f64,
    pub margins: Margins,
    pub images: Vec<ImagePlacement>,
}

impl PageContext {
    /// Placement of the block at pixel offset `(x, y)`. Raster rows grow
    /// downwards, page coordinates upwards.
    pub fn place(&mut self, image: ObjectId, x: usize, y: usize, width: usize, height: usize) {
        let uu = self.user_unit;
        self.images.push(ImagePlacement {
            image,
            x: x as f64 / uu + f64::from(self.margins.left),
            y: (self.height - y - height) as f64 / uu + f64::from(self.margins.bottom),
            width: width as f64 / uu,
            height: height as f64 / uu,
        });
    }
}

/// Georeferencing links of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoLinks {
    pub viewport: Option<ObjectId>,
    pub lgi_dict: Option<ObjectId>,
}

/// The page dictionary.
pub fn page_dict(parent: ObjectId, page: &PageContext, bands: usize, geo: GeoLinks) -> Dictionary {
    let uu = page.user_unit;
    let m = page.margins;
    let width = page.width as f64 / uu + f64::from(m.left) + f64::from(m.right);
    let height = page.height as f64 / uu + f64::from(m.bottom) + f64::from(m.top);

    let mut d = dict([
        ("Type", Object::name("Page")),
        ("Parent", parent.into()),
        ("MediaBox", Array::reals(&[0.0, 0.0, width, height]).into()),
        ("UserUnit", uu.into()),
        ("Contents", page.content.into()),
        ("Resources", page.resources.into()),
    ]);
    if bands == 4 {
        d.insert(
            "Group".into(),
            dict([
                ("Type", Object::name("Group")),
                ("S", Object::name("Transparency")),
                ("CS", Object::name("DeviceRGB")),
            ])
            .into(),
        );
    }
    if let Some(viewport) = geo.viewport {
        d.insert("VP".into(), vec![Object::from(viewport)].into());
    }
    if let Some(lgi) = geo.lgi_dict {
        d.insert("LGIDict".into(), lgi.into());
    }
    d
}

fn layer_tag(layer: ObjectId) -> String {
    format!("Lyr{}", layer.number)
}

/// `{Type OCG, Name (name)}`.
pub fn ocg(name: &str) -> Dictionary {
    dict([("Type", Object::name("OCG")), ("Name", Object::text(name))])
}

/// Body of the page content stream.
///
/// The images are drawn first, inside the raster layer if there is one,
/// followed by the extra content, inside its own layer.
pub fn content_stream(
    images: &[ImagePlacement],
    raster_layer: Option<ObjectId>,
    extra: Option<&str>,
    extra_layer: Option<ObjectId>,
) -> Vec<u8> {
    let mut out = String::new();
    if let Some(layer) = raster_layer {
        out.push_str(&format!("/OC /{} BDC\n", layer_tag(layer)));
    }
    for image in images {
        out.push_str(&format!(
            "q\n{} 0 0 {} {} {} cm\n/Image{} Do\nQ\n",
            format_real(image.width),
            format_real(image.height),
            format_real(image.x),
            format_real(image.y),
            image.image.number
        ));
    }
    if raster_layer.is_some() {
        out.push_str("EMC\n");
    }
    if let Some(extra) = extra {
        if let Some(layer) = extra_layer {
            out.push_str(&format!("/OC /{} BDC\n", layer_tag(layer)));
        }
        out.push_str(extra);
        out.push('\n');
        if extra_layer.is_some() {
            out.push_str("EMC\n");
        }
    }
    out.into_bytes()
}

fn times_font(base: &str) -> Object {
    dict([
        ("Type", Object::name("Font")),
        ("BaseFont", Object::name(base)),
        ("Encoding", Object::name("WinAnsiEncoding")),
        ("Subtype", Object::name("Type1")),
    ])
    .into()
}

/// The resources dictionary: every drawn image, the Times fonts the extra
/// content refers to and all layers of the document.
pub fn resources(images: &[ImagePlacement], extra: Option<&str>, layers: &[ObjectId]) -> Dictionary {
    let xobjects: Dictionary = images
        .iter()
        .map(|i| (Name::from(format!("Image{}", i.image.number).as_str()), Object::from(i.image)))
        .collect();
    let mut d = dict([("XObject", xobjects.into())]);

    let extra = extra.unwrap_or_default();
    let mut fonts = Dictionary::default();
    if extra.contains("/FTimesRoman") {
        fonts.insert("FTimesRoman".into(), times_font("Times-Roman"));
    }
    if extra.contains("/FTimesBold") {
        fonts.insert("FTimesBold".into(), times_font("Times-Bold"));
    }
    if !fonts.is_empty() {
        d.insert("Font".into(), fonts.into());
    }

    if !layers.is_empty() {
        let properties: Dictionary = layers
            .iter()
            .map(|l| (Name::from(layer_tag(*l).as_str()), Object::from(*l)))
            .collect();
        d.insert("Properties".into(), properties.into());
    }
    d
}
