//! Spatial reference handling needed by the georeferencing encoders.

pub use self::{esri::morph_to_esri, wkt::SrsNode};

mod esri;
mod transform;
pub mod wkt;

/// CRS operations the georeferencing encoders rely on.
pub trait SpatialRefService {
    /// Build a CRS from its definition.
    fn parse(&self, definition: &str) -> Option<SrsNode>;

    /// Transform `points` in place from `srs` to its geographic base CRS as
    /// `(longitude, latitude)`. Returns `false` if any point fails.
    fn to_geographic(&self, srs: &SrsNode, points: &mut [(f64, f64)]) -> bool;

    /// `srs` as ESRI flavoured WKT.
    fn esri_wkt(&self, srs: &SrsNode) -> Option<String>;
}

/// WKT1 based implementation with built-in inverse projections for
/// Transverse Mercator and Mercator.
#[derive(Debug, Clone, Copy, Default)]
pub struct WktSpatialRefService;

impl SpatialRefService for WktSpatialRefService {
    fn parse(&self, definition: &str) -> Option<SrsNode> {
        if definition.trim().is_empty() {
            return None;
        }
        SrsNode::parse(definition)
    }

    fn to_geographic(&self, srs: &SrsNode, points: &mut [(f64, f64)]) -> bool {
        transform::to_geographic(srs, points)
    }

    fn esri_wkt(&self, srs: &SrsNode) -> Option<String> {
        morph_to_esri(srs).map(|esri| esri.to_string())
    }
}
