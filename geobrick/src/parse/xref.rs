use nom::{branch, bytes, character, combinator, multi};
use nom_tracable::tracable_parser;

use super::{
    backward_search,
    error::{GbParseError, GbParseErrorKind},
    object::dictionary,
    GbParseResult, Span,
};
use crate::pdf::{trailer::TRAILER, Trailer, XrefEntry};

const STARTXREF: &str = "startxref";

/// One line of a classic xref table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefRecord {
    pub number: u32,
    pub entry: XrefEntry,
}

/// Xref table together with the trailer that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct XrefSection {
    pub records: Vec<XrefRecord>,
    pub trailer: Trailer,
}

/// Offset behind the last `startxref` keyword of the input.
#[tracable_parser]
pub fn startxref_tail(input: Span) -> GbParseResult<u64> {
    let (remainder, (trailing, _)) = backward_search(
        STARTXREF.len() + 2048,
        bytes::complete::tag_no_case(STARTXREF),
    )(input)?;
    let (trailing, _) = character::complete::multispace0(trailing)?;
    let (_, xref_pos) = character::complete::u64(trailing)
        .map_err(|_: nom::Err<GbParseError<_>>| {
            nom::Err::Error(GbParseError::new(input, GbParseErrorKind::StartxrefInvalid))
        })?;

    Ok((remainder, xref_pos))
}

#[tracable_parser]
fn xref_entries(input: Span) -> GbParseResult<Vec<XrefRecord>> {
    let (remainder, first) = character::complete::u32(input)?;
    let (remainder, _) = character::complete::space1(remainder)?;
    let (remainder, obj_count) = character::complete::u32(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    // the count is only a hint, the file might lie about it
    let mut entries = Vec::<XrefRecord>::with_capacity(obj_count.min(1024) as usize);

    let mut remainder = remainder;
    for i in 0..obj_count {
        let (inner_rmndr, offset) = character::complete::u64(remainder)?;
        let (inner_rmndr, _) = character::complete::multispace0(inner_rmndr)?;
        let (inner_rmndr, generation) = character::complete::u16(inner_rmndr)?;
        let (inner_rmndr, _) = character::complete::multispace0(inner_rmndr)?;
        let (inner_rmndr, free) = branch::alt((
            combinator::value(false, bytes::complete::tag("n")),
            combinator::value(true, bytes::complete::tag("f")),
        ))(inner_rmndr)?;
        let (inner_rmndr, _) = character::complete::multispace0(inner_rmndr)?;

        let number = first
            .checked_add(i)
            .ok_or_else(|| nom::Err::Failure(GbParseError::new(input, GbParseErrorKind::XrefInvalid)))?;
        entries.push(XrefRecord {
            number,
            entry: XrefEntry {
                offset,
                generation,
                free,
            },
        });
        remainder = inner_rmndr;
    }

    Ok((remainder, entries))
}

#[tracable_parser]
pub fn xref_table(input: Span) -> GbParseResult<Vec<XrefRecord>> {
    // xref keyword
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, _) = bytes::complete::tag("xref")(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, entries) = multi::many1(xref_entries)(remainder)?;

    Ok((remainder, entries.into_iter().flatten().collect()))
}

/// `xref` table followed by `trailer` and the trailer dictionary.
#[tracable_parser]
pub fn xref_section(input: Span) -> GbParseResult<XrefSection> {
    let (remainder, records) = xref_table(input)?;
    let (remainder, _) = bytes::complete::tag(TRAILER)(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, dict) = dictionary(remainder)?;
    let trailer = Trailer::try_from(&dict)
        .map_err(|err| nom::Err::Failure(GbParseError::new(input, err.into())))?;

    Ok((remainder, XrefSection { records, trailer }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse::span, pdf::ObjectId};

    #[test]
    fn test_startxref_tail() {
        let res = startxref_tail(span(b"         startxref\n2132"));
        assert!(matches!(res, Ok((_, 2132))));

        let res = startxref_tail(span(b"         startxref\r\n555\n%%EOF\n"));
        assert!(matches!(res, Ok((_, 555))));
    }

    #[test]
    fn test_invalid_startxref_tail() {
        // to big
        let res = startxref_tail(span(b"         startxref\n9999999999999999999999999999999"));
        assert!(matches!(res, Err(nom::Err::Error(_))));

        let res = startxref_tail(span(b"no pointer here\n%%EOF\n"));
        assert!(res.is_err());
    }

    #[test]
    fn test_xref_table_with_runs() {
        let input = b"xref\n0 1\n0000000000 65535 f \n3 2\n0000000120 00000 n \n0000000240 00001 n \ntrailer";
        let (rest, records) = xref_table(span(input)).unwrap();
        assert_eq!(*rest.fragment(), b"trailer");
        assert_eq!(records.len(), 3);
        assert!(records[0].entry.free);
        assert_eq!(records[0].entry.generation, 65535);
        assert_eq!(records[1].number, 3);
        assert_eq!(records[1].entry.offset, 120);
        assert_eq!(records[2].number, 4);
        assert_eq!(records[2].entry.generation, 1);
    }

    #[test]
    fn test_xref_section() {
        let input = b"xref\n0 2\n0000000000 65535 f \n0000000015 00000 n \ntrailer\n<< /Size 2 /Root 1 0 R /Prev 99 >>\nstartxref\n";
        let (_, section) = xref_section(span(input)).unwrap();
        assert_eq!(section.records.len(), 2);
        assert_eq!(section.trailer.size, 2);
        assert_eq!(section.trailer.root, ObjectId::new(1, 0));
        assert_eq!(section.trailer.previous, Some(99));
    }
}
