use crate::raster::Gcp;

/// Pixel space tolerance when checking that 4 points form a rectangle.
const RECTANGLE_TOLERANCE: f64 = 0.5;

/// Indices of the upper left, upper right, lower right and lower left point
/// of a 4 point set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Corners {
    pub ul: usize,
    pub ur: usize,
    pub lr: usize,
    pub ll: usize,
}

impl Corners {
    /// Classify 4 points by the quadrant they occupy relative to their
    /// centroid.
    ///
    /// Points that sit on a centroid axis match no quadrant. Corners left
    /// without a point fall back to index 0.
    pub fn find(gcps: &[Gcp; 4]) -> Self {
        let mean_pixel = gcps.iter().map(|g| g.pixel).sum::<f64>() / 4.0;
        let mean_line = gcps.iter().map(|g| g.line).sum::<f64>() / 4.0;

        let (mut ul, mut ur, mut lr, mut ll) = (None, None, None, None);
        for (i, g) in gcps.iter().enumerate() {
            let left = g.pixel < mean_pixel;
            let right = g.pixel > mean_pixel;
            let top = g.line < mean_line;
            let bottom = g.line > mean_line;
            if left && top {
                ul = Some(i);
            } else if right && top {
                ur = Some(i);
            } else if right && bottom {
                lr = Some(i);
            } else if left && bottom {
                ll = Some(i);
            }
        }

        if ul.is_none() || ur.is_none() || lr.is_none() || ll.is_none() {
            log::warn!("cannot tell the 4 corners apart, unmatched corners use the first point");
        }
        Self {
            ul: ul.unwrap_or(0),
            ur: ur.unwrap_or(0),
            lr: lr.unwrap_or(0),
            ll: ll.unwrap_or(0),
        }
    }

    /// Whether the classified points form an axis aligned rectangle in pixel
    /// space.
    pub fn is_rectangle(&self, gcps: &[Gcp; 4]) -> bool {
        let within = |a: f64, b: f64| (a - b).abs() <= RECTANGLE_TOLERANCE;
        within(gcps[self.ul].pixel, gcps[self.ll].pixel)
            && within(gcps[self.ur].pixel, gcps[self.lr].pixel)
            && within(gcps[self.ul].line, gcps[self.ur].line)
            && within(gcps[self.ll].line, gcps[self.lr].line)
    }
}
