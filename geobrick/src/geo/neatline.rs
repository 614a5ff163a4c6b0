//! `POLYGON ((x y, ...))` neatlines.

use nom::{bytes, character, combinator, error::ErrorKind, multi, sequence};
use nom_tracable::tracable_parser;

use crate::parse::{
    error::{GbParseError, GbParseErrorKind},
    span, GbParseResult, Span,
};

fn is_number(chr: u8) -> bool {
    chr.is_ascii_digit() || matches!(chr, b'.' | b'-' | b'+' | b'e' | b'E')
}

#[tracable_parser]
fn coordinate(input: Span) -> GbParseResult<f64> {
    let (remainder, digits) = bytes::complete::take_while1(is_number)(input)?;
    let value = std::str::from_utf8(digits.fragment())
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| nom::Err::Error(GbParseError::new(input, GbParseErrorKind::Nom(ErrorKind::Float))))?;

    Ok((remainder, value))
}

/// `x y` with an optional third ordinate, which is dropped.
#[tracable_parser]
fn point(input: Span) -> GbParseResult<(f64, f64)> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, x) = coordinate(remainder)?;
    let (remainder, _) = character::complete::multispace1(remainder)?;
    let (remainder, y) = coordinate(remainder)?;
    let (remainder, _) = combinator::opt(sequence::preceded(character::complete::multispace1, coordinate))(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    Ok((remainder, (x, y)))
}

#[tracable_parser]
fn ring(input: Span) -> GbParseResult<Vec<(f64, f64)>> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, _) = character::complete::char('(')(remainder)?;
    let (remainder, points) = multi::separated_list1(character::complete::char(','), point)(remainder)?;
    let (remainder, _) = character::complete::char(')')(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    Ok((remainder, points))
}

/// Polygon rings, the exterior ring first.
#[tracable_parser]
pub fn polygon(input: Span) -> GbParseResult<Vec<Vec<(f64, f64)>>> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, _) = bytes::complete::tag_no_case("POLYGON")(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, _) = character::complete::char('(')(remainder)?;
    let (remainder, rings) = multi::separated_list1(character::complete::char(','), ring)(remainder)?;
    let (remainder, _) = character::complete::char(')')(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    Ok((remainder, rings))
}

/// Exterior ring of a WKT polygon, closing point included. `None` for
/// anything that is not a polygon.
pub fn exterior_ring(wkt: &str) -> Option<Vec<(f64, f64)>> {
    match polygon(span(wkt.as_bytes())) {
        Ok((remainder, mut rings)) if remainder.fragment().is_empty() => Some(rings.swap_remove(0)),
        _ => {
            log::debug!("neatline is not a polygon: {}", wkt);
            None
        }
    }
}
