//! OGC best practice georeferencing (`LGIDict` version 2.1).

use super::{corners::Corners, neatline::exterior_ring, GeoContext};
use crate::{
    pdf::{dict, Array, Dictionary, Object},
    raster::{gcps_to_geo_transform, Gcp},
    srs::SrsNode,
};

/// `(code, semi major axis, inverse flattening, inverse flattening
/// tolerance)` of the ellipsoids with an OGC best practice code.
const ELLIPSOIDS: &[(&str, f64, f64, f64)] = &[
    ("CD", 6378249.145, 293.465, 0.0001),
    ("KA", 6378245.0, 298.3, 0.0001),
    ("IN", 6378388.0, 297.0, 0.0001),
    ("AN", 6378160.0, 298.25, 0.0001),
    ("BR", 6377397.155, 299.1528128, 0.0001),
    ("BN", 6377483.865, 299.1528128, 0.0001),
    ("RF", 6378137.0, 298.257222101, 0.000001),
    ("CC", 6378206.4, 294.9786982, 0.0001),
    ("AM", 6377340.189, 299.3249646, 0.0001),
    ("AA", 6377563.396, 299.3249646, 0.0001),
    ("HE", 6378200.0, 298.3, 0.0001),
    ("FA", 6378155.0, 298.3, 0.0001),
    ("WD", 6378135.0, 298.26, 0.0001),
    ("WE", 6378137.0, 298.257223563, 0.000001),
];

/// `(datum name, EPSG datum code, OGC best practice code)`.
const DATUMS: &[(&str, i64, &str)] = &[
    ("WGS_1984", 6326, "WGE"),
    ("North_American_Datum_1927", 6267, "NAS"),
    ("North_American_Datum_1983", 6269, "NAR"),
];

fn ellipsoid_code(semi_major: f64, inv_flattening: f64) -> Option<&'static str> {
    ELLIPSOIDS
        .iter()
        .find(|(_, a, inv_f, tolerance)| (semi_major - a).abs() < 0.01 && (inv_flattening - inv_f).abs() < *tolerance)
        .map(|(code, ..)| *code)
}

/// `ToWGS84` dictionary. The rotation and scale terms are only written if
/// one of them is not zero.
fn to_wgs84(values: &[&str]) -> Option<Dictionary> {
    if values.len() < 3 {
        return None;
    }
    let is_zero = |v: &&str| v.trim().is_empty() || v.trim().parse::<f64>().map_or(false, |v| v == 0.0);
    let keys = ["dx", "dy", "dz", "rx", "ry", "rz", "sf"];
    let count = if values.len() >= 7 && !values[3..7].iter().all(is_zero) {
        7
    } else {
        3
    };
    Some(keys.iter().zip(values).take(count).map(|(k, v)| ((*k).into(), Object::text(v))).collect())
}

/// The `Datum` entry: a well known datum code or a description of the datum.
pub fn datum(srs: &SrsNode) -> Object {
    let description = srs.find("DATUM").and_then(|d| d.children.first()).map(|c| c.value.as_str());
    let Some(description) = description else {
        log::warn!("no datum name, defaulting to WGS84");
        return Object::text("WGE");
    };

    let epsg_datum = srs.epsg_code(Some("DATUM"));
    if let Some((_, _, code)) = DATUMS
        .iter()
        .find(|(name, epsg, _)| description.eq_ignore_ascii_case(name) || epsg_datum == Some(*epsg))
    {
        return Object::text(code);
    }

    log::debug!("unhandled datum name ({}), writing datum parameters", description);
    let mut datum = Dictionary::default();
    let Some(spheroid) = srs.find("SPHEROID").filter(|s| s.children.len() >= 3) else {
        return datum.into();
    };
    datum.insert("Description".into(), Object::text(description));

    let (semi_major, inv_flattening) = (srs.semi_major(), srs.inv_flattening());
    let ellipsoid = match ellipsoid_code(semi_major, inv_flattening) {
        Some(code) => Object::text(code),
        None => {
            let name = &spheroid.children[0].value;
            log::debug!("unhandled ellipsoid name ({}), writing ellipsoid parameters", name);
            dict([
                ("Description", Object::text(name)),
                ("SemiMajorAxis", Object::precise(semi_major)),
                ("InvFlattening", Object::precise(inv_flattening)),
            ])
            .into()
        }
    };
    datum.insert("Ellipsoid".into(), ellipsoid);

    if let Some(shift) = srs.towgs84().as_deref().and_then(to_wgs84) {
        datum.insert("ToWGS84".into(), shift.into());
    }
    datum.into()
}

/// The `Projection` dictionary. `None` for CRS kinds that cannot be
/// expressed.
pub fn projection(srs: &SrsNode) -> Option<Dictionary> {
    let mut projection = dict([("Type", Object::name("Projection")), ("Datum", datum(srs))]);
    let mut set = |key: &str, value: Object| {
        projection.insert(key.into(), value);
    };
    let parm = |name: &str, default: f64| Object::precise(srs.norm_proj_parm(name, default));

    let projection_type = match srs.projection() {
        None if srs.is_geographic() => "GEOGRAPHIC",
        None if srs.is_local() => "LOCAL CARTESIAN",
        None => {
            log::warn!("unsupported SRS type");
            return None;
        }
        Some(method) if method.eq_ignore_ascii_case("Transverse_Mercator") => match srs.utm_zone() {
            Some((zone, north)) => {
                set("Hemisphere", Object::text(if north { "N" } else { "S" }));
                set("Zone", Object::from(zone as i64));
                "UT"
            }
            None => {
                set("OriginLatitude", parm("latitude_of_origin", 90.0));
                set("CentralMeridian", parm("central_meridian", 0.0));
                set("ScaleFactor", parm("scale_factor", 1.0));
                set("FalseEasting", parm("false_easting", 0.0));
                set("FalseNorthing", parm("false_northing", 0.0));
                "TC"
            }
        },
        Some(method) if method.eq_ignore_ascii_case("Polar_Stereographic") => {
            let lat = srs.norm_proj_parm("latitude_of_origin", 0.0);
            let universal = lat.abs() == 90.0
                && srs.norm_proj_parm("central_meridian", 0.0) == 0.0
                && srs.norm_proj_parm("scale_factor", 1.0) == 0.994
                && srs.norm_proj_parm("false_easting", 0.0) == 200000.0
                && srs.norm_proj_parm("false_northing", 0.0) == 200000.0;
            if universal {
                set("Hemisphere", Object::text(if lat > 0.0 { "N" } else { "S" }));
                "UP"
            } else {
                set("LatitudeTrueScale", parm("latitude_of_origin", 0.0));
                set("LongitudeDownFromPole", parm("central_meridian", 0.0));
                set("ScaleFactor", parm("scale_factor", 1.0));
                set("FalseEasting", parm("false_easting", 0.0));
                set("FalseNorthing", parm("false_northing", 0.0));
                "PG"
            }
        }
        Some(method) if method.eq_ignore_ascii_case("Lambert_Conformal_Conic_2SP") => {
            set("StandardParallelOne", parm("standard_parallel_1", 0.0));
            set("StandardParallelTwo", parm("standard_parallel_2", 0.0));
            set("OriginLatitude", parm("latitude_of_origin", 0.0));
            set("CentralMeridian", parm("central_meridian", 0.0));
            set("FalseEasting", parm("false_easting", 0.0));
            set("FalseNorthing", parm("false_northing", 0.0));
            "LE"
        }
        Some(method) if method.eq_ignore_ascii_case("Mercator_1SP") => {
            set("CentralMeridian", parm("central_meridian", 0.0));
            set("OriginLatitude", parm("latitude_of_origin", 0.0));
            set("ScaleFactor", parm("scale_factor", 1.0));
            set("FalseEasting", parm("false_easting", 0.0));
            set("FalseNorthing", parm("false_northing", 0.0));
            "MC"
        }
        Some(method) => {
            log::warn!("unhandled projection type ({}) for now", method);
            "GEOGRAPHIC"
        }
    };
    set("ProjectionType", Object::text(projection_type));

    if srs.is_projected() {
        match srs.linear_units().1 {
            u if u == 1.0 => set("Units", Object::text("M")),
            u if u == 0.3048 => set("Units", Object::text("FT")),
            _ => {}
        }
    }
    Some(projection)
}

fn page_points<'a>(ctx: &GeoContext, points: impl IntoIterator<Item = &'a (f64, f64)>) -> Array {
    let mut out = Array::new();
    for (pixel, line) in points {
        let (x, y) = ctx.to_page(*pixel, *line);
        out.push(Object::precise(x));
        out.push(Object::precise(y));
    }
    out
}

/// The `LGIDict` of the raster of `ctx`.
///
/// With a geotransform (given, or fitted exactly through the GCPs) the page
/// to map transform is written as `CTM`, otherwise every GCP becomes a
/// `Registration` point.
pub fn lgi_dict(ctx: &GeoContext) -> Option<Dictionary> {
    let raster = ctx.raster;
    let width = raster.width() as f64;
    let height = raster.height() as f64;

    let gcps = Some(raster.gcps()).filter(|g| g.len() >= 4);
    let wkt = if gcps.is_some() {
        raster.gcp_projection()
    } else {
        raster.projection()
    };
    let mut geo_transform = raster.geo_transform();
    if geo_transform.is_none() && gcps.is_none() {
        return None;
    }
    let wkt = wkt.filter(|w| !w.is_empty())?;

    if geo_transform.is_none() {
        geo_transform = gcps.and_then(gcps_to_geo_transform);
        if geo_transform.is_none() {
            log::debug!("could not compute a geotransform with exact match, writing Registration");
        }
    }

    let srs = ctx.srs.parse(wkt)?;
    let mut projection = projection(&srs)?;

    let neatline_text = ctx.neatline().filter(|n| !n.is_empty());
    let disabled = neatline_text.map_or(false, |n| n.eq_ignore_ascii_case("NO"));
    let mut neatline = None;
    if let (Some(gt), Some(text)) = (geo_transform, neatline_text.filter(|_| !disabled)) {
        let ring = exterior_ring(text).filter(|ring| ring.len() >= 5);
        if let (Some(ring), Some(inverse)) = (ring, gt.invert()) {
            let pixels: Vec<(f64, f64)> = ring[..ring.len() - 1].iter().map(|(x, y)| inverse.apply(*x, *y)).collect();
            let skewed = <[(f64, f64); 4]>::try_from(&pixels[..]).ok().map_or(false, |quad| {
                let quad = quad.map(|(pixel, line)| Gcp::new(pixel, line, 0.0, 0.0));
                !Corners::find(&quad).is_rectangle(&quad)
            });
            if skewed {
                log::warn!("neatline coordinates should form a rectangle in pixel space, ignoring it");
            } else {
                neatline = Some(page_points(ctx, &pixels));
            }
        }
    }

    if disabled {
        neatline = None;
    } else if let (Some(gcps), None) = (gcps, &neatline) {
        neatline = Some(match <&[Gcp; 4]>::try_from(gcps) {
            Ok(quad) => {
                let c = Corners::find(quad);
                let at = |i: usize| (quad[i].pixel, quad[i].line);
                page_points(ctx, &[at(c.ul), at(c.ll), at(c.lr), at(c.ur)])
            }
            Err(_) => {
                let points: Vec<_> = gcps.iter().map(|g| (g.pixel, g.line)).collect();
                page_points(ctx, &points)
            }
        });
    } else if neatline.is_none() {
        neatline = Some(page_points(ctx, &[(0.0, 0.0), (0.0, height), (width, height), (width, 0.0)]));
    }

    let mut lgi = dict([("Type", Object::name("LGIDict")), ("Version", Object::text("2.1"))]);
    match (geo_transform, gcps) {
        (Some(gt), _) => {
            let gt = gt.0;
            let uu = ctx.user_unit;
            let x1 = f64::from(ctx.margins.left);
            let y2 = height / uu + f64::from(ctx.margins.bottom);
            let mut ctm = [gt[1] * uu, gt[2] * uu, -gt[4] * uu, -gt[5] * uu, 0.0, 0.0];
            ctm[4] = gt[0] - (ctm[0] * x1 + ctm[2] * y2);
            ctm[5] = gt[3] - (ctm[1] * x1 + ctm[3] * y2);
            lgi.insert("CTM".into(), Array::precise_reals(&ctm).into());
        }
        (None, Some(gcps)) => {
            let registration: Vec<Object> = gcps
                .iter()
                .map(|g| {
                    let (x, y) = ctx.to_page(g.pixel, g.line);
                    Array::precise_reals(&[x, y, g.x, g.y]).into()
                })
                .collect();
            lgi.insert("Registration".into(), registration.into());
        }
        (None, None) => return None,
    }
    if let Some(neatline) = neatline {
        lgi.insert("Neatline".into(), neatline.into());
    }
    if let Some(description) = srs.children.first() {
        lgi.insert("Description".into(), Object::text(&description.value));
    }
    if ctx.write_wkt {
        projection.insert("WKT".into(), Object::text(wkt));
    }
    lgi.insert("Projection".into(), projection.into());
    Some(lgi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        options::Margins,
        raster::{GeoTransform, MemRaster},
        srs::{
            wkt::tests::{UTM32N, WGS84},
            WktSpatialRefService,
        },
    };

    fn srs(wkt: &str) -> SrsNode {
        SrsNode::parse(wkt).unwrap()
    }

    fn get<'a>(d: &'a Dictionary, key: &str) -> Option<&'a Object> {
        d.get(key.as_bytes())
    }

    fn context<'a>(raster: &'a MemRaster) -> GeoContext<'a> {
        GeoContext {
            raster,
            srs: &WktSpatialRefService,
            user_unit: 1.0,
            neatline: None,
            margins: Margins::default(),
            write_wkt: false,
        }
    }

    #[test]
    fn utm_projection() {
        let p = projection(&srs(UTM32N)).unwrap();
        assert_eq!(get(&p, "Datum"), Some(&Object::text("WGE")));
        assert_eq!(get(&p, "Hemisphere"), Some(&Object::text("N")));
        assert_eq!(get(&p, "Zone"), Some(&Object::Integer(32)));
        assert_eq!(get(&p, "ProjectionType"), Some(&Object::text("UT")));
        assert_eq!(get(&p, "Units"), Some(&Object::text("M")));
    }

    #[test]
    fn general_transverse_mercator() {
        let tm = UTM32N.replace("PARAMETER[\"scale_factor\",0.9996]", "PARAMETER[\"scale_factor\",0.9999]");
        let p = projection(&srs(&tm)).unwrap();
        assert_eq!(get(&p, "ProjectionType"), Some(&Object::text("TC")));
        assert_eq!(get(&p, "OriginLatitude"), Some(&Object::precise(0.0)));
        assert_eq!(get(&p, "CentralMeridian"), Some(&Object::precise(9.0)));
        assert_eq!(get(&p, "ScaleFactor"), Some(&Object::precise(0.9999)));
        assert_eq!(get(&p, "Zone"), None);
    }

    #[test]
    fn geographic_and_unsupported() {
        let p = projection(&srs(WGS84)).unwrap();
        assert_eq!(get(&p, "ProjectionType"), Some(&Object::text("GEOGRAPHIC")));
        assert_eq!(get(&p, "Units"), None);

        let local = projection(&srs("LOCAL_CS[\"grid\",UNIT[\"metre\",1]]")).unwrap();
        assert_eq!(get(&local, "ProjectionType"), Some(&Object::text("LOCAL CARTESIAN")));

        assert!(projection(&srs("GEOCCS[\"earth centered\"]")).is_none());
    }

    #[test]
    fn universal_polar_stereographic() {
        let ups = r#"PROJCS["UPS North",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]]],PROJECTION["Polar_Stereographic"],PARAMETER["latitude_of_origin",90],PARAMETER["central_meridian",0],PARAMETER["scale_factor",0.994],PARAMETER["false_easting",2000000],PARAMETER["false_northing",2000000],UNIT["metre",1]]"#;
        let p = projection(&srs(ups)).unwrap();
        // false easting and northing of UPS are 2000 km, the best practice code needs 200 km
        assert_eq!(get(&p, "ProjectionType"), Some(&Object::text("PG")));
        assert_eq!(get(&p, "LatitudeTrueScale"), Some(&Object::precise(90.0)));

        let p = projection(&srs(&ups.replace("2000000", "200000"))).unwrap();
        assert_eq!(get(&p, "ProjectionType"), Some(&Object::text("UP")));
        assert_eq!(get(&p, "Hemisphere"), Some(&Object::text("N")));
    }

    #[test]
    fn custom_datum() {
        let wkt = r#"GEOGCS["DHDN",DATUM["Deutsches_Hauptdreiecksnetz",SPHEROID["Bessel 1841",6377397.155,299.1528128],TOWGS84[598.1,73.7,418.2,0.202,0.045,-2.455,6.7]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;
        let d = datum(&srs(wkt));
        let d = d.dictionary().unwrap();
        assert_eq!(get(d, "Description"), Some(&Object::text("Deutsches_Hauptdreiecksnetz")));
        assert_eq!(get(d, "Ellipsoid"), Some(&Object::text("BR")));
        let shift = get(d, "ToWGS84").unwrap().dictionary().unwrap();
        assert_eq!(shift.len(), 7);
        assert_eq!(get(shift, "sf"), Some(&Object::text("6.7")));

        let zero_rotation = wkt.replace("0.202,0.045,-2.455,6.7", "0,0,0,0");
        let d = datum(&srs(&zero_rotation));
        let shift = get(d.dictionary().unwrap(), "ToWGS84").unwrap().dictionary().unwrap();
        assert_eq!(shift.len(), 3);

        let odd_ellipsoid = wkt.replace("6377397.155,299.1528128", "6370000,300");
        let d = datum(&srs(&odd_ellipsoid));
        let ellipsoid = get(d.dictionary().unwrap(), "Ellipsoid").unwrap().dictionary().unwrap();
        assert_eq!(get(ellipsoid, "Description"), Some(&Object::text("Bessel 1841")));
        assert_eq!(get(ellipsoid, "SemiMajorAxis"), Some(&Object::precise(6370000.0)));
    }

    #[test]
    fn well_known_datums() {
        let nad27 = r#"GEOGCS["NAD27",DATUM["North_American_Datum_1927",SPHEROID["Clarke 1866",6378206.4,294.978698213898]]]"#;
        assert_eq!(datum(&srs(nad27)), Object::text("NAS"));
        let by_code = r#"GEOGCS["x",DATUM["whatever",SPHEROID["GRS 1980",6378137,298.257222101],AUTHORITY["EPSG","6269"]]]"#;
        assert_eq!(datum(&srs(by_code)), Object::text("NAR"));
        assert_eq!(datum(&srs("GEOGCS[\"no datum\"]")), Object::text("WGE"));
    }

    #[test]
    fn ctm_from_geotransform() {
        let raster =
            MemRaster::new(100, 50, 1).with_geo_transform(GeoTransform([500000.0, 10.0, 0.0, 5600000.0, 0.0, -10.0]), UTM32N);
        let lgi = lgi_dict(&context(&raster)).unwrap();
        assert_eq!(get(&lgi, "Type"), Some(&Object::name("LGIDict")));
        assert_eq!(get(&lgi, "Version"), Some(&Object::text("2.1")));
        assert_eq!(
            get(&lgi, "CTM"),
            Some(&Array::precise_reals(&[10.0, 0.0, 0.0, 10.0, 500000.0, 5599500.0]).into())
        );
        assert_eq!(
            get(&lgi, "Neatline"),
            Some(&Array::precise_reals(&[0.0, 50.0, 0.0, 0.0, 100.0, 0.0, 100.0, 50.0]).into())
        );
        assert_eq!(get(&lgi, "Description"), Some(&Object::text("WGS 84 / UTM zone 32N")));
        let projection = get(&lgi, "Projection").unwrap().dictionary().unwrap();
        assert_eq!(get(projection, "WKT"), None);
    }

    #[test]
    fn registration_from_gcps() {
        let gcps = vec![
            Gcp::new(0.0, 0.0, 10.0, 50.0),
            Gcp::new(10.0, 0.0, 11.0, 50.5),
            Gcp::new(10.0, 10.0, 13.0, 49.0),
            Gcp::new(0.0, 10.0, 10.0, 49.0),
        ];
        let raster = MemRaster::new(10, 10, 1).with_gcps(gcps, WGS84).with_metadata("NEATLINE", "NO");
        let mut ctx = context(&raster);
        ctx.write_wkt = true;
        let lgi = lgi_dict(&ctx).unwrap();
        assert_eq!(get(&lgi, "CTM"), None);
        let registration = get(&lgi, "Registration").unwrap().array().unwrap();
        assert_eq!(registration.len(), 4);
        assert_eq!(registration[1], Array::precise_reals(&[10.0, 10.0, 11.0, 50.5]).into());
        assert_eq!(get(&lgi, "Neatline"), None);
        let projection = get(&lgi, "Projection").unwrap().dictionary().unwrap();
        assert_eq!(get(projection, "WKT"), Some(&Object::text(WGS84)));
    }

    #[test]
    fn skewed_neatline_falls_back_to_full_extent() {
        let raster = MemRaster::new(100, 100, 1)
            .with_geo_transform(GeoTransform([0.0, 1.0, 0.0, 100.0, 0.0, -1.0]), WGS84)
            .with_metadata("NEATLINE", "POLYGON ((10 90,95 90,90 20,10 20,10 90))");
        let lgi = lgi_dict(&context(&raster)).unwrap();
        assert_eq!(
            get(&lgi, "Neatline"),
            Some(&Array::precise_reals(&[0.0, 100.0, 0.0, 0.0, 100.0, 0.0, 100.0, 100.0]).into())
        );
    }
}
