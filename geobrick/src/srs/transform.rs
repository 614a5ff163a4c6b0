//! Projected to geographic coordinates on the CRS's own ellipsoid.

use super::wkt::SrsNode;

const MAX_ITERATIONS: usize = 15;

struct Ellipsoid {
    a: f64,
    e2: f64,
}

impl Ellipsoid {
    fn of(srs: &SrsNode) -> Option<Self> {
        let a = srs.semi_major();
        let inv_f = srs.inv_flattening();
        if a <= 0.0 {
            return None;
        }
        // an inverse flattening of 0 describes a sphere
        let f = if inv_f == 0.0 { 0.0 } else { 1.0 / inv_f };
        Some(Self { a, e2: 2.0 * f - f * f })
    }

    /// Meridian arc length from the equator.
    fn meridian_arc(&self, phi: f64) -> f64 {
        let (e2, e4, e6) = (self.e2, self.e2 * self.e2, self.e2 * self.e2 * self.e2);
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }
}

/// Projection parameters shared by the supported methods, angles in radians
/// and offsets in metres.
struct Parameters {
    lat0: f64,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    to_metre: f64,
}

impl Parameters {
    fn of(srs: &SrsNode) -> Self {
        Self {
            lat0: srs.norm_proj_parm("latitude_of_origin", 0.0).to_radians(),
            lon0: srs.norm_proj_parm("central_meridian", 0.0).to_radians(),
            k0: srs.norm_proj_parm("scale_factor", 1.0),
            false_easting: srs.norm_proj_parm("false_easting", 0.0),
            false_northing: srs.norm_proj_parm("false_northing", 0.0),
            to_metre: srs.linear_units().1,
        }
    }
}

fn inverse_transverse_mercator(ell: &Ellipsoid, p: &Parameters, x: f64, y: f64) -> (f64, f64) {
    let e2 = ell.e2;
    let ep2 = e2 / (1.0 - e2);
    let m = ell.meridian_arc(p.lat0) + (y - p.false_northing) / p.k0;
    let mu = m / (ell.a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin1, cos1, tan1) = (phi1.sin(), phi1.cos(), phi1.tan());
    let c1 = ep2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let n1 = ell.a / (1.0 - e2 * sin1 * sin1).sqrt();
    let r1 = ell.a * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
    let d = (x - p.false_easting) / (n1 * p.k0);

    let lat = phi1
        - (n1 * tan1 / r1)
            * (d * d / 2.0 - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1) * d.powi(6) / 720.0);
    let lon = p.lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5) / 120.0)
            / cos1;
    (lon, lat)
}

fn inverse_mercator(ell: &Ellipsoid, p: &Parameters, x: f64, y: f64) -> Option<(f64, f64)> {
    let e = ell.e2.sqrt();
    let ak0 = ell.a * p.k0;
    let t = (-(y - p.false_northing) / ak0).exp();
    let mut phi = std::f64::consts::FRAC_PI_2 - 2.0 * t.atan();
    for _ in 0..MAX_ITERATIONS {
        let es = e * phi.sin();
        let next = std::f64::consts::FRAC_PI_2 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(e / 2.0)).atan();
        if (next - phi).abs() < 1e-12 {
            return Some(((x - p.false_easting) / ak0 + p.lon0, next));
        }
        phi = next;
    }
    None
}

/// Transform `points` in place from `srs` to its geographic base CRS, as
/// `(longitude, latitude)` in degrees.
pub fn to_geographic(srs: &SrsNode, points: &mut [(f64, f64)]) -> bool {
    if srs.is_geographic() {
        return true;
    }
    if !srs.is_projected() {
        return false;
    }
    let Some(ell) = Ellipsoid::of(srs) else {
        return false;
    };
    let params = Parameters::of(srs);
    let method = srs.projection().unwrap_or_default().to_ascii_lowercase();

    for point in points.iter_mut() {
        let x = point.0 * params.to_metre;
        let y = point.1 * params.to_metre;
        let geographic = match method.as_str() {
            "transverse_mercator" => Some(inverse_transverse_mercator(&ell, &params, x, y)),
            "mercator_1sp" => inverse_mercator(&ell, &params, x, y),
            _ => {
                log::debug!("no inverse for projection method {}", method);
                None
            }
        };
        match geographic {
            Some((lon, lat)) if lon.is_finite() && lat.is_finite() => {
                *point = (lon.to_degrees(), lat.to_degrees());
            }
            _ => return false,
        }
    }
    true
}
