//! ESRI flavoured WKT, as expected in the `GCS` dictionary of an ISO 32000
//! measure.

use super::wkt::SrsNode;

const STRIPPED: &[&str] = &["AUTHORITY", "AXIS", "TOWGS84", "EXTENSION"];

/// OGC projection method names and their ESRI counterparts.
const PROJECTIONS: &[(&str, &str)] = &[
    ("Transverse_Mercator", "Transverse_Mercator"),
    ("Mercator_1SP", "Mercator"),
    ("Mercator_2SP", "Mercator"),
    ("Lambert_Conformal_Conic_1SP", "Lambert_Conformal_Conic"),
    ("Lambert_Conformal_Conic_2SP", "Lambert_Conformal_Conic"),
    ("Polar_Stereographic", "Stereographic"),
    ("Albers_Conic_Equal_Area", "Albers"),
    ("Equirectangular", "Equidistant_Cylindrical"),
];

const UNITS: &[(&str, &str)] = &[
    ("degree", "Degree"),
    ("metre", "Meter"),
    ("meter", "Meter"),
    ("foot", "Foot"),
    ("US survey foot", "Foot_US"),
];

/// `Some_name with spaces / more` becomes `Some_name_with_spaces_more`.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// `false_easting` becomes `False_Easting`.
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

fn rename_first(node: &mut SrsNode, rename: impl FnOnce(&str) -> String) {
    if let Some(name) = node.children.first_mut() {
        name.value = rename(&name.value);
    }
}

fn geogcs_name(name: &str) -> String {
    match name {
        "WGS 84" | "WGS_1984" => "GCS_WGS_1984".to_owned(),
        n if n.starts_with("GCS_") => n.to_owned(),
        n => format!("GCS_{}", sanitize(n)),
    }
}

fn datum_name(name: &str) -> String {
    if name.starts_with("D_") {
        return name.to_owned();
    }
    let name = name.strip_prefix("Datum_").unwrap_or(name);
    format!("D_{}", sanitize(name))
}

fn spheroid_name(name: &str) -> String {
    match name {
        "WGS 84" => "WGS_1984".to_owned(),
        n => sanitize(n),
    }
}

fn morph(node: &mut SrsNode) {
    let keyword = node.value.to_ascii_uppercase();
    match keyword.as_str() {
        "PROJCS" => rename_first(node, sanitize),
        "GEOGCS" => rename_first(node, geogcs_name),
        "DATUM" => rename_first(node, datum_name),
        "SPHEROID" => rename_first(node, spheroid_name),
        "PROJECTION" => rename_first(node, |n| {
            PROJECTIONS
                .iter()
                .find(|(ogc, _)| ogc.eq_ignore_ascii_case(n))
                .map_or_else(|| n.to_owned(), |(_, esri)| (*esri).to_owned())
        }),
        "PARAMETER" => rename_first(node, title_case),
        "UNIT" => rename_first(node, |n| {
            UNITS
                .iter()
                .find(|(ogc, _)| ogc.eq_ignore_ascii_case(n))
                .map_or_else(|| n.to_owned(), |(_, esri)| (*esri).to_owned())
        }),
        _ => {}
    }
    for child in node.children.iter_mut().skip(1) {
        morph(child);
    }
}

/// Rewrite `srs` the way ESRI software expects it.
pub fn morph_to_esri(srs: &SrsNode) -> Option<SrsNode> {
    if !(srs.is_geographic() || srs.is_projected()) {
        return None;
    }
    let mut esri = srs.clone();
    for keyword in STRIPPED {
        esri.strip(keyword);
    }
    morph(&mut esri);
    Some(esri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::wkt::tests::{UTM32N, WGS84};

    #[test]
    fn geographic() {
        let esri = morph_to_esri(&SrsNode::parse(WGS84).unwrap()).unwrap();
        assert_eq!(
            esri.to_string(),
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["Degree",0.0174532925199433]]"#
        );
    }

    #[test]
    fn projected() {
        let esri = morph_to_esri(&SrsNode::parse(UTM32N).unwrap()).unwrap();
        let wkt = esri.to_string();
        assert!(wkt.starts_with(r#"PROJCS["WGS_84_UTM_zone_32N",GEOGCS["GCS_WGS_1984""#), "{}", wkt);
        assert!(wkt.contains(r#"PARAMETER["False_Easting",500000]"#));
        assert!(wkt.contains(r#"PARAMETER["Central_Meridian",9]"#));
        assert!(wkt.ends_with(r#"UNIT["Meter",1]]"#), "{}", wkt);
        assert!(!wkt.contains("AUTHORITY"));
        assert!(!wkt.contains("AXIS"));
    }

    #[test]
    fn names() {
        assert_eq!(sanitize("NAD27 / Texas (South)"), "NAD27_Texas_South");
        assert_eq!(datum_name("Datum_Potsdam"), "D_Potsdam");
        assert_eq!(datum_name("D_Existing"), "D_Existing");
        assert_eq!(title_case("latitude_of_origin"), "Latitude_Of_Origin");
        assert!(morph_to_esri(&SrsNode::parse("LOCAL_CS[\"x\"]").unwrap()).is_none());
    }
}
