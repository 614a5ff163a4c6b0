//! ISO 32000 geospatial measure: a `Viewport` referencing a `Measure`
//! referencing a `GCS` dictionary.

use super::{corners::Corners, neatline::exterior_ring, GeoContext};
use crate::{
    pdf::{dict, Array, Dictionary, Object, ObjectId},
    raster::Gcp,
};

const UNIT_SQUARE: [f64; 8] = [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0];

/// Georeferencing of one page in ISO 32000 terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Iso32000 {
    /// Georeferenced area of the page, in page units.
    pub bbox: [f64; 4],
    /// Latitude and longitude of the upper left, lower left, lower right and
    /// upper right corner.
    pub gpts: [f64; 8],
    pub geographic: bool,
    pub esri_wkt: String,
    pub epsg: Option<i64>,
}

impl Iso32000 {
    /// Compute the measure for the raster of `ctx`.
    ///
    /// 4 GCPs, or a rectangular 4 point neatline, define the corners;
    /// otherwise the geotransform maps the raster corners. GCPs that do not
    /// form a rectangle in pixel space make the raster unrepresentable.
    pub fn compute(ctx: &GeoContext) -> Option<Self> {
        let raster = ctx.raster;
        let width = raster.width() as f64;
        let height = raster.height() as f64;

        let geo_transform = raster.geo_transform();
        let mut gcps: Option<[Gcp; 4]> = raster.gcps().try_into().ok();
        let wkt = if gcps.is_some() {
            raster.gcp_projection()
        } else {
            raster.projection()
        };
        if geo_transform.is_none() && gcps.is_none() {
            return None;
        }
        let wkt = wkt.filter(|w| !w.is_empty())?;

        if let Some(gt) = geo_transform {
            let ring = ctx
                .neatline()
                .filter(|n| !n.is_empty())
                .and_then(exterior_ring)
                .filter(|ring| ring.len() == 5);
            if let (Some(ring), Some(inverse)) = (ring, gt.invert()) {
                let neatline: [Gcp; 4] = std::array::from_fn(|i| {
                    let (x, y) = ring[i];
                    let (pixel, line) = inverse.apply(x, y);
                    Gcp::new(pixel, line, x, y)
                });
                if Corners::find(&neatline).is_rectangle(&neatline) {
                    gcps = Some(neatline);
                } else {
                    log::warn!("neatline coordinates should form a rectangle in pixel space, ignoring it");
                    for (i, g) in neatline.iter().enumerate() {
                        log::debug!("pixel[{}] = {:.1}, line[{}] = {:.1}", i, g.pixel, i, g.line);
                    }
                }
            }
        }

        let (ul, lr, mut points) = match (gcps, geo_transform) {
            (Some(gcps), _) => {
                let c = Corners::find(&gcps);
                if !c.is_rectangle(&gcps) {
                    log::warn!("GCPs should form a rectangle in pixel space");
                    return None;
                }
                let at = |i: usize| (gcps[i].x, gcps[i].y);
                (
                    (gcps[c.ul].pixel, gcps[c.ul].line),
                    (gcps[c.lr].pixel, gcps[c.lr].line),
                    [at(c.ul), at(c.ll), at(c.lr), at(c.ur)],
                )
            }
            (None, Some(gt)) => (
                (0.0, 0.0),
                (width, height),
                [
                    gt.apply(0.0, 0.0),
                    gt.apply(0.0, height),
                    gt.apply(width, height),
                    gt.apply(width, 0.0),
                ],
            ),
            (None, None) => return None,
        };

        let srs = ctx.srs.parse(wkt)?;
        if !ctx.srs.to_geographic(&srs, &mut points) {
            log::debug!("cannot transform the corners to geographic coordinates");
            return None;
        }
        let esri_wkt = ctx.srs.esri_wkt(&srs)?;

        let (left, top) = ctx.to_page(ul.0, ul.1);
        let (right, bottom) = ctx.to_page(lr.0, lr.1);
        let mut gpts = [0.0; 8];
        for (i, (lon, lat)) in points.iter().enumerate() {
            gpts[2 * i] = *lat;
            gpts[2 * i + 1] = *lon;
        }

        Some(Self {
            bbox: [left, bottom, right, top],
            gpts,
            geographic: srs.is_geographic(),
            esri_wkt,
            epsg: srs.epsg_code(None).filter(|code| *code != 0),
        })
    }

    pub fn viewport(&self, measure: ObjectId) -> Dictionary {
        dict([
            ("Type", Object::name("Viewport")),
            ("Name", Object::text("Layer")),
            ("BBox", Array::reals(&self.bbox).into()),
            ("Measure", measure.into()),
        ])
    }

    pub fn measure(&self, gcs: ObjectId) -> Dictionary {
        dict([
            ("Type", Object::name("Measure")),
            ("Subtype", Object::name("GEO")),
            ("Bounds", Array::reals(&UNIT_SQUARE).into()),
            ("GPTS", Array::reals(&self.gpts).into()),
            ("LPTS", Array::reals(&UNIT_SQUARE).into()),
            ("GCS", gcs.into()),
        ])
    }

    pub fn gcs(&self) -> Dictionary {
        let kind = if self.geographic { "GEOGCS" } else { "PROJCS" };
        let mut gcs = dict([("Type", Object::name(kind)), ("WKT", Object::text(&self.esri_wkt))]);
        if let Some(code) = self.epsg {
            gcs.insert("EPSG".into(), Object::Integer(code));
        }
        gcs
    }
}
