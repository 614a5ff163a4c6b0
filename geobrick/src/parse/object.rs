use nom::{branch, bytes, character, combinator, error::ErrorKind, multi, sequence, InputLength, Slice};
use nom_tracable::tracable_parser;

use super::{
    error::{GbParseError, GbParseErrorKind},
    GbParseResult, Span,
};
use crate::pdf::{Array, Bytes, PdfString, Dictionary, Name, Object, ObjectId};

pub(crate) const TRUE_OBJECT: &str = "true";
pub(crate) const FALSE_OBJECT: &str = "false";
pub(crate) const NULL_OBJECT: &str = "null";

pub(crate) fn is_delimiter(chr: u8) -> bool {
    matches!(
        chr,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

pub(crate) fn is_regular(chr: u8) -> bool {
    !is_delimiter(chr) && !chr.is_ascii_whitespace()
}

fn nom_error(input: Span, kind: ErrorKind) -> nom::Err<GbParseError<Span>> {
    nom::Err::Error(GbParseError::new(input, GbParseErrorKind::Nom(kind)))
}

/// Consume all whitespace. If input doesn't start with a whitespace, peek the
/// next char and require it to be a delimiter.
#[tracable_parser]
fn require_termination(input: Span) -> GbParseResult<()> {
    let (remainder, whitespace) = character::complete::multispace0(input)?;
    if whitespace.input_len() == 0 && remainder.input_len() > 0 {
        combinator::peek(bytes::complete::take_while_m_n(1, 1, is_delimiter))(remainder)?;
    }
    Ok((remainder, ()))
}

/// Literal string. Escapes are resolved, balanced parentheses are part of
/// the string.
#[tracable_parser]
pub(crate) fn string_object(input: Span) -> GbParseResult<Object> {
    let (content, _) = character::complete::char('(')(input)?;
    let bytes = *content.fragment();
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    loop {
        let c = match bytes.get(i) {
            Some(c) => *c,
            None => return Err(nom_error(input, ErrorKind::Char)),
        };
        i += 1;
        match c {
            b'\\' => {
                let escaped = match bytes.get(i) {
                    Some(e) => *e,
                    None => return Err(nom_error(input, ErrorKind::Escaped)),
                };
                i += 1;
                match escaped {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    // line continuation
                    b'\n' => {}
                    b'\r' => {
                        if bytes.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                    }
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            match bytes.get(i) {
                                Some(d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value & 0xff) as u8);
                    }
                    other => out.push(other),
                }
            }
            b'(' => {
                depth += 1;
                out.push(c);
            }
            b')' if depth == 0 => break,
            b')' => {
                depth -= 1;
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    let (remainder, _) = character::complete::multispace0(content.slice(i..))?;

    Ok((remainder, Object::String(PdfString::from(out))))
}

#[tracable_parser]
pub(crate) fn hex_string_object(input: Span) -> GbParseResult<Object> {
    let (remainder, content) = sequence::delimited(
        character::complete::char('<'),
        bytes::complete::take_while(|c: u8| c.is_ascii_hexdigit() || c.is_ascii_whitespace()),
        character::complete::char('>'),
    )(input)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    let mut digits: Vec<u8> = content.fragment().iter().copied().filter(u8::is_ascii_hexdigit).collect();
    // a missing last digit is zero
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    let decoded = hex::decode(&digits).map_err(|_| nom_error(input, ErrorKind::HexDigit))?;

    Ok((remainder, Object::HexString(Bytes::from(decoded))))
}

#[tracable_parser]
pub(crate) fn bool_object(input: Span) -> GbParseResult<Object> {
    let (remainder, obj) = branch::alt((
        combinator::value(Object::Bool(true), bytes::complete::tag(TRUE_OBJECT)),
        combinator::value(Object::Bool(false), bytes::complete::tag(FALSE_OBJECT)),
    ))(input)?;

    let (remainder, _) = require_termination(remainder)?;

    Ok((remainder, obj))
}

#[tracable_parser]
fn integer_object(input: Span) -> GbParseResult<Object> {
    let (remainder, value) = character::complete::i64(input)?;
    let (remainder, _) = require_termination(remainder)?;

    Ok((remainder, Object::Integer(value)))
}

#[tracable_parser]
fn real_object(input: Span) -> GbParseResult<Object> {
    let (remainder, digits) = combinator::recognize(sequence::pair(
        combinator::opt(character::complete::one_of("+-")),
        branch::alt((
            combinator::recognize(sequence::pair(
                character::complete::digit1,
                combinator::opt(sequence::pair(character::complete::char('.'), character::complete::digit0)),
            )),
            combinator::recognize(sequence::pair(character::complete::char('.'), character::complete::digit1)),
        )),
    ))(input)?;
    let value = std::str::from_utf8(digits.fragment())
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| nom_error(input, ErrorKind::Float))?;
    let (remainder, _) = require_termination(remainder)?;

    Ok((remainder, Object::from(value)))
}

#[tracable_parser]
pub(crate) fn null_object(input: Span) -> GbParseResult<Object> {
    let (remainder, _) = bytes::complete::tag(NULL_OBJECT)(input)?;
    let (remainder, _) = require_termination(remainder)?;

    Ok((remainder, Object::Null))
}

/// Replace all `#XX` escapes with the byte they stand for.
fn decode_name(raw: &[u8]) -> Name {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let Ok(decoded) = hex::decode(&raw[i + 1..i + 3]) {
                out.extend_from_slice(&decoded);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    Name::from(out)
}

#[tracable_parser]
pub(crate) fn name(input: Span) -> GbParseResult<Name> {
    let (remainder, _) = character::complete::char('/')(input)?;
    let (remainder, raw) = bytes::complete::take_while(is_regular)(remainder)?;
    let (remainder, _) = require_termination(remainder)?;

    Ok((remainder, decode_name(raw.fragment())))
}

#[tracable_parser]
pub(crate) fn name_object(input: Span) -> GbParseResult<Object> {
    combinator::map(name, Object::from)(input)
}

#[tracable_parser]
fn dictionary_entry(input: Span) -> GbParseResult<(Name, Object)> {
    let (remainder, name) = name(input)?;
    let (remainder, obj) = object(remainder)?;

    Ok((remainder, (name, obj)))
}

#[tracable_parser]
pub fn dictionary(input: Span) -> GbParseResult<Dictionary> {
    let (remainder, _) = bytes::complete::tag("<<")(input)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, map) = multi::fold_many0(dictionary_entry, Dictionary::default, |mut acc, (name, obj)| {
        acc.insert(name, obj);
        acc
    })(remainder)?;
    let (remainder, _) = bytes::complete::tag(">>")(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    Ok((remainder, map))
}

#[tracable_parser]
pub(crate) fn dictionary_object(input: Span) -> GbParseResult<Object> {
    combinator::map(dictionary, Object::Dictionary)(input)
}

#[tracable_parser]
pub(crate) fn array_object(input: Span) -> GbParseResult<Object> {
    let (remainder, _) = character::complete::char('[')(input)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, array) = multi::fold_many0(object, Array::new, |mut acc, obj| {
        acc.push(obj);
        acc
    })(remainder)?;
    let (remainder, _) = character::complete::char(']')(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    Ok((remainder, Object::Array(array)))
}

#[tracable_parser]
fn reference_object(input: Span) -> GbParseResult<Object> {
    let (remainder, number) = character::complete::u32(input)?;
    let (remainder, _) = character::complete::multispace1(remainder)?;
    let (remainder, generation) = character::complete::u16(remainder)?;
    let (remainder, _) = character::complete::multispace1(remainder)?;
    let (remainder, _) = character::complete::char('R')(remainder)?;
    let (remainder, _) = require_termination(remainder)?;

    Ok((remainder, Object::Reference(ObjectId::new(number, generation))))
}

#[tracable_parser]
pub fn object(input: Span) -> GbParseResult<Object> {
    // The order is important!
    branch::alt((
        dictionary_object,
        array_object,
        string_object,
        hex_string_object,
        // `0 0 R` is a reference while `0 0` are two integers.
        reference_object,
        integer_object,
        real_object,
        bool_object,
        null_object,
        name_object,
    ))(input)
}

/// Object body found at an xref offset.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    pub id: ObjectId,
    pub object: Object,
    /// Position of the first stream byte relative to the start of the parsed
    /// buffer. `None` for objects without a stream.
    pub stream_offset: Option<usize>,
}

#[tracable_parser]
pub fn indirect_object(input: Span) -> GbParseResult<IndirectObject> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, number) = character::complete::u32(remainder)?;
    let (remainder, _) = character::complete::multispace1(remainder)?;
    let (remainder, generation) = character::complete::u16(remainder)?;
    let (remainder, _) = character::complete::multispace1(remainder)?;
    let (remainder, _) = bytes::complete::tag("obj")(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, object) = object(remainder)?;
    let id = ObjectId::new(number, generation);

    let stream: GbParseResult<_> =
        sequence::pair(bytes::complete::tag("stream"), character::complete::line_ending)(remainder);
    if let Ok((data, _)) = stream {
        let stream_offset = Some(data.location_offset());
        return Ok((
            data,
            IndirectObject {
                id,
                object,
                stream_offset,
            },
        ));
    }

    let (remainder, _) = bytes::complete::tag("endobj")(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    Ok((
        remainder,
        IndirectObject {
            id,
            object,
            stream_offset: None,
        },
    ))
}
