//! Georeferencing of a page.
//!
//! Two conventions exist: the ISO 32000 viewport/measure dictionaries and
//! the OGC best practice `LGIDict`. Both are computed here as plain
//! dictionaries; allocating and writing the objects is up to the document
//! writer. A convention that cannot be expressed for a raster yields `None`
//! and the page is written without it.

use crate::{options::Margins, raster::RasterSource, srs::SpatialRefService};

pub use self::{corners::Corners, iso32000::Iso32000, neatline::exterior_ring};

mod corners;
pub mod iso32000;
mod neatline;
pub mod ogc_bp;

/// Inputs shared by both encoders.
pub struct GeoContext<'a> {
    pub raster: &'a dyn RasterSource,
    pub srs: &'a dyn SpatialRefService,
    /// Output units per 1/72 inch.
    pub user_unit: f64,
    /// Explicit neatline, overrides the `NEATLINE` metadata item.
    pub neatline: Option<&'a str>,
    pub margins: Margins,
    /// Stamp the source WKT onto the OGC projection dictionary.
    pub write_wkt: bool,
}

impl<'a> GeoContext<'a> {
    /// Neatline to use, `None` if neither given nor in the metadata.
    fn neatline(&self) -> Option<&'a str> {
        self.neatline.or_else(|| self.raster.metadata_item("NEATLINE"))
    }

    /// Page position of a raster pixel position. PDF pages grow upwards.
    fn to_page(&self, pixel: f64, line: f64) -> (f64, f64) {
        let height = self.raster.height() as f64;
        (
            pixel / self.user_unit + f64::from(self.margins.left),
            (height - line) / self.user_unit + f64::from(self.margins.bottom),
        )
    }
}
