//! WKT1 coordinate reference system trees.

use std::{f64::consts::PI, fmt::Display};

use nom::{branch, bytes, character, combinator, multi, sequence};
use nom_tracable::tracable_parser;

use crate::parse::{span, GbParseResult, Span};

const WGS84_SEMI_MAJOR: f64 = 6378137.0;
const WGS84_INV_FLATTENING: f64 = 298.257223563;
const DEGREE_TO_RADIAN: f64 = PI / 180.0;

/// Parameters that hold angles. Everything ending in easting/northing is a
/// linear value.
const ANGULAR_PARAMETERS: &[&str] = &[
    "latitude_of_origin",
    "central_meridian",
    "standard_parallel_1",
    "standard_parallel_2",
    "longitude_of_center",
    "latitude_of_center",
    "longitude_of_origin",
    "latitude_of_point_1",
    "longitude_of_point_1",
    "latitude_of_point_2",
    "longitude_of_point_2",
    "azimuth",
    "rectified_grid_angle",
    "pseudo_standard_parallel_1",
    "straight_vertical_longitude_from_pole",
];

/// One node of a WKT tree: `KEYWORD[child, ...]`, a quoted string or a bare
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct SrsNode {
    pub value: String,
    pub quoted: bool,
    pub children: Vec<SrsNode>,
}

impl SrsNode {
    pub fn new(value: &str, children: Vec<SrsNode>) -> Self {
        Self {
            value: value.to_owned(),
            quoted: false,
            children,
        }
    }

    pub fn quoted(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            quoted: true,
            children: Vec::new(),
        }
    }

    /// Parse a complete WKT string.
    pub fn parse(wkt: &str) -> Option<Self> {
        let (remainder, node) = srs_tree(span(wkt.as_bytes())).ok()?;
        if !remainder.fragment().iter().all(u8::is_ascii_whitespace) {
            log::debug!("trailing characters after WKT: {}", String::from_utf8_lossy(remainder.fragment()));
            return None;
        }
        Some(node)
    }

    pub fn is(&self, keyword: &str) -> bool {
        self.value.eq_ignore_ascii_case(keyword)
    }

    /// First node named `keyword`, depth first, starting with `self`.
    pub fn find(&self, keyword: &str) -> Option<&SrsNode> {
        if self.is(keyword) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(keyword))
    }

    /// Direct child named `keyword`.
    pub fn child(&self, keyword: &str) -> Option<&SrsNode> {
        self.children.iter().find(|c| c.is(keyword))
    }

    /// Value of child `index` of the first node named `keyword`.
    pub fn attr_value(&self, keyword: &str, index: usize) -> Option<&str> {
        self.find(keyword)?.children.get(index).map(|c| c.value.as_str())
    }

    /// `(authority, code)` of the node named `target`, or of the root.
    pub fn authority(&self, target: Option<&str>) -> Option<(&str, &str)> {
        let node = match target {
            Some(keyword) => self.find(keyword)?,
            None => self,
        };
        let authority = node.child("AUTHORITY")?;
        Some((
            authority.children.first()?.value.as_str(),
            authority.children.get(1)?.value.as_str(),
        ))
    }

    /// EPSG code of the node named `target` (or the root), if the authority is
    /// EPSG.
    pub fn epsg_code(&self, target: Option<&str>) -> Option<i64> {
        let (name, code) = self.authority(target)?;
        if !name.eq_ignore_ascii_case("EPSG") {
            return None;
        }
        code.trim().parse().ok()
    }

    pub fn is_geographic(&self) -> bool {
        self.is("GEOGCS")
    }

    pub fn is_projected(&self) -> bool {
        self.is("PROJCS")
    }

    pub fn is_local(&self) -> bool {
        self.is("LOCAL_CS")
    }

    /// Name of the projection method, projected CRSs only.
    pub fn projection(&self) -> Option<&str> {
        self.attr_value("PROJECTION", 0)
    }

    fn numeric(&self, keyword: &str, index: usize) -> Option<f64> {
        self.attr_value(keyword, index)?.trim().parse().ok()
    }

    pub fn semi_major(&self) -> f64 {
        self.numeric("SPHEROID", 1).unwrap_or(WGS84_SEMI_MAJOR)
    }

    pub fn inv_flattening(&self) -> f64 {
        self.numeric("SPHEROID", 2).unwrap_or(WGS84_INV_FLATTENING)
    }

    /// Radians per angular unit of the geographic CRS.
    pub fn angular_units(&self) -> f64 {
        self.find("GEOGCS")
            .and_then(|g| g.child("UNIT"))
            .and_then(|u| u.children.get(1))
            .and_then(|v| v.value.trim().parse().ok())
            .unwrap_or(DEGREE_TO_RADIAN)
    }

    /// `(name, metres per unit)` of a projected or local CRS.
    pub fn linear_units(&self) -> (&str, f64) {
        let unit = if self.is_projected() || self.is_local() {
            self.child("UNIT")
        } else {
            None
        };
        unit.and_then(|u| {
            let name = u.children.first()?.value.as_str();
            let factor = u.children.get(1)?.value.trim().parse().ok()?;
            Some((name, factor))
        })
        .unwrap_or(("Meter", 1.0))
    }

    /// Raw value of a projection parameter.
    pub fn proj_parm(&self, name: &str) -> Option<f64> {
        let projcs = self.find("PROJCS")?;
        projcs
            .children
            .iter()
            .filter(|c| c.is("PARAMETER"))
            .find(|c| c.children.first().map_or(false, |n| n.value.eq_ignore_ascii_case(name)))
            .and_then(|c| c.children.get(1))
            .and_then(|v| v.value.trim().parse().ok())
    }

    /// Projection parameter in degrees (angles) or metres (easting and
    /// northing).
    pub fn norm_proj_parm(&self, name: &str, default: f64) -> f64 {
        let Some(value) = self.proj_parm(name) else {
            return default;
        };
        let lower = name.to_ascii_lowercase();
        if ANGULAR_PARAMETERS.contains(&lower.as_str()) {
            let to_radians = self.angular_units();
            if (to_radians - DEGREE_TO_RADIAN).abs() > 1e-15 {
                return value * to_radians / DEGREE_TO_RADIAN;
            }
        } else if lower.starts_with("false_") {
            return value * self.linear_units().1;
        }
        value
    }

    /// `(zone, north)` if this is a Transverse Mercator CRS with UTM
    /// parameters.
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        if !self.is_projected() || !self.projection()?.eq_ignore_ascii_case("Transverse_Mercator") {
            return None;
        }
        if self.norm_proj_parm("latitude_of_origin", 0.0) != 0.0
            || self.norm_proj_parm("scale_factor", 1.0) != 0.9996
            || self.norm_proj_parm("false_easting", 0.0) != 500000.0
        {
            return None;
        }
        let north = match self.norm_proj_parm("false_northing", 0.0) {
            n if n == 0.0 => true,
            n if n == 10000000.0 => false,
            _ => return None,
        };
        let central_meridian = self.norm_proj_parm("central_meridian", 0.0);
        let zone = (central_meridian + 186.0) / 6.0;
        if (zone - zone.trunc() - 0.5).abs() > 0.00001 || !(-177.00001..=177.000001).contains(&central_meridian) {
            return None;
        }
        Some((zone as u32, north))
    }

    /// The values of the `TOWGS84` node.
    pub fn towgs84(&self) -> Option<Vec<&str>> {
        self.find("TOWGS84")
            .map(|node| node.children.iter().map(|c| c.value.as_str()).collect())
    }

    /// Remove every node named `keyword` below `self`.
    pub fn strip(&mut self, keyword: &str) {
        self.children.retain(|c| !c.is(keyword));
        for child in &mut self.children {
            child.strip(keyword);
        }
    }
}

impl Display for SrsNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.value)?;
        } else {
            f.write_str(&self.value)?;
        }
        if !self.children.is_empty() {
            f.write_str("[")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                child.fmt(f)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

fn is_token(chr: u8) -> bool {
    !chr.is_ascii_whitespace() && !b",[]()\"".contains(&chr)
}

fn lossy(input: Span) -> String {
    String::from_utf8_lossy(input.fragment()).into_owned()
}

#[tracable_parser]
fn quoted_value(input: Span) -> GbParseResult<SrsNode> {
    let (remainder, value) = sequence::delimited(
        character::complete::char('"'),
        bytes::complete::take_while(|c| c != b'"'),
        character::complete::char('"'),
    )(input)?;

    Ok((remainder, SrsNode::quoted(&lossy(value))))
}

#[tracable_parser]
fn children(input: Span) -> GbParseResult<Vec<SrsNode>> {
    let (remainder, _) = character::complete::one_of("[(")(input)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, children) = multi::separated_list1(
        sequence::tuple((
            character::complete::multispace0,
            character::complete::char(','),
            character::complete::multispace0,
        )),
        srs_tree,
    )(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, _) = character::complete::one_of("])")(remainder)?;

    Ok((remainder, children))
}

#[tracable_parser]
fn keyword_node(input: Span) -> GbParseResult<SrsNode> {
    let (remainder, value) = bytes::complete::take_while1(is_token)(input)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, children) = combinator::opt(children)(remainder)?;

    Ok((remainder, SrsNode::new(&lossy(value), children.unwrap_or_default())))
}

/// A WKT node with all of its children.
#[tracable_parser]
pub fn srs_tree(input: Span) -> GbParseResult<SrsNode> {
    let (remainder, _) = character::complete::multispace0(input)?;
    branch::alt((quoted_value, keyword_node))(remainder)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const WGS84: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

    pub const UTM32N: &str = r#"PROJCS["WGS 84 / UTM zone 32N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",9],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","32632"]]"#;

    #[test]
    fn parse_geographic() {
        let srs = SrsNode::parse(WGS84).unwrap();
        assert!(srs.is_geographic());
        assert_eq!(srs.children[0], SrsNode::quoted("WGS 84"));
        assert_eq!(srs.authority(None), Some(("EPSG", "4326")));
        assert_eq!(srs.epsg_code(Some("DATUM")), Some(6326));
        assert_eq!(srs.attr_value("DATUM", 0), Some("WGS_1984"));
        assert_eq!(srs.semi_major(), 6378137.0);
        assert_eq!(srs.inv_flattening(), 298.257223563);
        assert_eq!(srs.projection(), None);
    }

    #[test]
    fn parse_projected() {
        let srs = SrsNode::parse(UTM32N).unwrap();
        assert!(srs.is_projected());
        assert_eq!(srs.projection(), Some("Transverse_Mercator"));
        assert_eq!(srs.norm_proj_parm("central_meridian", 0.0), 9.0);
        assert_eq!(srs.norm_proj_parm("standard_parallel_1", 33.0), 33.0);
        assert_eq!(srs.linear_units(), ("metre", 1.0));
        assert_eq!(srs.utm_zone(), Some((32, true)));
        assert_eq!(srs.epsg_code(None), Some(32632));
        // the AXIS values are bare tokens
        assert_eq!(srs.find("AXIS").unwrap().children[1], SrsNode::new("EAST", vec![]));
    }

    #[test]
    fn parse_tolerates_whitespace_and_parentheses() {
        let srs = SrsNode::parse("LOCAL_CS ( \"grid\" , UNIT[\"metre\", 1] )\n").unwrap();
        assert!(srs.is_local());
        assert_eq!(srs.children.len(), 2);
        assert_eq!(srs.linear_units(), ("metre", 1.0));
    }

    #[test]
    fn reject_garbage() {
        assert!(SrsNode::parse("").is_none());
        assert!(SrsNode::parse("GEOGCS[\"x\"").is_none());
        assert!(SrsNode::parse("GEOGCS[\"x\"] trailing").is_none());
    }

    #[test]
    fn southern_and_non_utm_zones() {
        let south = UTM32N.replace("PARAMETER[\"false_northing\",0]", "PARAMETER[\"false_northing\",10000000]");
        assert_eq!(SrsNode::parse(&south).unwrap().utm_zone(), Some((32, false)));

        let shifted = UTM32N.replace("PARAMETER[\"central_meridian\",9]", "PARAMETER[\"central_meridian\",10]");
        assert_eq!(SrsNode::parse(&shifted).unwrap().utm_zone(), None);
    }

    #[test]
    fn feet_are_normalised() {
        let feet = UTM32N
            .replace("UNIT[\"metre\",1,AUTHORITY[\"EPSG\",\"9001\"]]", "UNIT[\"foot\",0.3048]")
            .replace("PARAMETER[\"false_easting\",500000]", "PARAMETER[\"false_easting\",1000]");
        let srs = SrsNode::parse(&feet).unwrap();
        assert_eq!(srs.linear_units(), ("foot", 0.3048));
        assert!((srs.norm_proj_parm("false_easting", 0.0) - 304.8).abs() < 1e-9);
    }

    #[test]
    fn display_writes_wkt() {
        let srs = SrsNode::parse("GEOGCS[\"a b\", UNIT[\"degree\", 0.5]]").unwrap();
        assert_eq!(srs.to_string(), "GEOGCS[\"a b\",UNIT[\"degree\",0.5]]");
    }
}
