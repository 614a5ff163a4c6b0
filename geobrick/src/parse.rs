//! Narrow PDF reader: enough to continue a file this crate wrote before.
//!
//! The parsers work on [`Span`]s so that `trace` builds can follow every
//! parser step. Offsets reported by the parsers are absolute positions in the
//! parsed buffer.

use std::{
    collections::HashSet,
    io::{Read, Seek, SeekFrom},
};

use nom::{InputLength, Slice};
use nom_locate::LocatedSpan;
use nom_tracable::TracableInfo;

use crate::{
    error::GbError,
    pdf::{Object, ObjectId},
};

use self::error::{GbParseError, GbParseErrorKind};

pub mod error;
pub mod object;
pub mod trailer;
pub mod xref;

pub type Span<'a> = LocatedSpan<&'a [u8], TracableInfo>;
pub type GbParseResult<'a, O> = nom::IResult<Span<'a>, O, GbParseError<Span<'a>>>;

/// Wrap a buffer for the parsers in this module.
pub fn span(input: &[u8]) -> Span<'_> {
    let info = TracableInfo::new().forward(true).backward(true);
    LocatedSpan::new_extra(input, info)
}

/// Apply `parser` at every position of the last `limit` bytes, starting at
/// the end. On success the bytes in front of the match are returned as
/// remainder together with what the parser left over and its output.
pub(crate) fn backward_search<'a, O, P>(
    limit: usize,
    mut parser: P,
) -> impl FnMut(Span<'a>) -> GbParseResult<'a, (Span<'a>, O)>
where
    P: nom::Parser<Span<'a>, O, GbParseError<Span<'a>>>,
{
    move |input: Span<'a>| {
        let len = input.input_len();
        for start in (len.saturating_sub(limit)..len).rev() {
            if let Ok((trailing, out)) = parser.parse(input.slice(start..)) {
                return Ok((input.slice(..start), (trailing, out)));
            }
        }
        Err(nom::Err::Error(GbParseError::new(
            input,
            GbParseErrorKind::BackwardSearchNotFound,
        )))
    }
}

const INITIAL_CHUNK: usize = 16 * 1024;

/// Read from `offset` and run `parser` on the bytes. The window grows until
/// the parser succeeds or the end of the file is reached.
pub(crate) fn parse_at<R, T, P>(stream: &mut R, offset: u64, mut parser: P) -> Result<T, GbError>
where
    R: Read + Seek,
    P: FnMut(Span) -> GbParseResult<T>,
{
    let mut chunk = INITIAL_CHUNK;
    loop {
        stream.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::with_capacity(chunk);
        stream.by_ref().take(chunk as u64).read_to_end(&mut buf)?;
        let at_eof = buf.len() < chunk;
        match parser(span(&buf)) {
            Ok((_, value)) => return Ok(value),
            Err(err) if at_eof => return Err(err.into()),
            Err(_) => chunk *= 4,
        }
    }
}

/// Find the offset of object `number` by walking the xref sections from
/// `start_xref` along their `/Prev` links. The newest section wins.
pub fn find_object_offset<R: Read + Seek>(
    stream: &mut R,
    start_xref: u64,
    number: u32,
) -> Result<Option<u64>, GbError> {
    let mut visited = HashSet::new();
    let mut next = Some(start_xref);
    while let Some(offset) = next {
        if !visited.insert(offset) {
            log::warn!("xref sections form a loop at offset {}", offset);
            break;
        }
        let section = parse_at(stream, offset, xref::xref_section)?;
        if let Some(record) = section.records.iter().find(|r| r.number == number) {
            if record.entry.free {
                return Ok(None);
            }
            return Ok(Some(record.entry.offset));
        }
        next = section.trailer.previous;
    }
    Ok(None)
}

/// Read the current version of an indirect object.
pub fn read_object<R: Read + Seek>(stream: &mut R, start_xref: u64, id: ObjectId) -> Result<Object, GbError> {
    let offset = find_object_offset(stream, start_xref, id.number)?.ok_or(GbError::MissingObject(id))?;
    let found = parse_at(stream, offset, object::indirect_object)?;
    if found.id.number != id.number {
        return Err(GbError::Parse(GbParseErrorKind::UnexpectedObject));
    }
    Ok(found.object)
}
