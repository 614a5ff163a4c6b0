//! Trailer recovery for append mode.
//!
//! This is a heuristic scan tuned to files written by this crate, not a
//! general PDF reader: the last `startxref` must sit in the final 128 bytes
//! and the interesting trailer keys in the first 1 KiB behind `trailer`.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use nom::{bytes, character, FindSubstring};
use nom_tracable::tracable_parser;

use super::{span, xref::startxref_tail, GbParseResult, Span};
use crate::{
    error::GbError,
    pdf::{
        trailer::{TrailerState, TRAILER},
        ObjectId,
    },
};

const TAIL_LEN: u64 = 128;
const TRAILER_WINDOW: u64 = 1024;

/// `<num> <gen> R` with optional leading spaces.
#[tracable_parser]
pub fn indirect_reference(input: Span) -> GbParseResult<ObjectId> {
    let (remainder, _) = character::complete::space0(input)?;
    let (remainder, number) = character::complete::u32(remainder)?;
    let (remainder, _) = character::complete::space1(remainder)?;
    let (remainder, generation) = character::complete::u16(remainder)?;
    let (remainder, _) = character::complete::space1(remainder)?;
    let (remainder, _) = bytes::complete::tag("R")(remainder)?;

    Ok((remainder, ObjectId::new(number, generation)))
}

#[tracable_parser]
fn size_value(input: Span) -> GbParseResult<usize> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, size) = character::complete::u32(remainder)?;

    Ok((remainder, size as usize))
}

/// Position of the value behind `key` inside `window`.
fn value_after<'a>(window: &'a [u8], key: &[u8]) -> Option<&'a [u8]> {
    window.find_substring(key).map(|pos| &window[pos + key.len()..])
}

/// Recover numbering state from the last trailer of `stream`. The stream is
/// left positioned at its end.
pub fn recover<S: Read + Seek>(stream: &mut S) -> Result<TrailerState, GbError> {
    let file_size = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(file_size.saturating_sub(TAIL_LEN)))?;
    let mut tail = Vec::with_capacity(TAIL_LEN as usize);
    stream.by_ref().take(TAIL_LEN).read_to_end(&mut tail)?;

    let (_, last_start_xref) =
        startxref_tail(span(&tail)).map_err(|_| GbError::MalformedTrailer("cannot find startxref"))?;
    log::debug!("last startxref at {}", last_start_xref);

    stream.seek(SeekFrom::Start(last_start_xref))?;
    let mut reader = BufReader::new(&mut *stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Err(GbError::MalformedTrailer("cannot find trailer"));
        }
        if line.starts_with(TRAILER) {
            break;
        }
    }

    let mut window = Vec::with_capacity(TRAILER_WINDOW as usize);
    (&mut reader).take(TRAILER_WINDOW).read_to_end(&mut window)?;
    drop(reader);

    let last_xref_size = value_after(&window, b"/Size")
        .and_then(|value| size_value(span(value)).ok())
        .map(|(_, size)| size)
        .filter(|size| *size > 0)
        .ok_or(GbError::MalformedTrailer("cannot read /Size"))?;

    let catalog = value_after(&window, b"/Root")
        .and_then(|value| indirect_reference(span(value)).ok())
        .map(|(_, id)| id)
        .ok_or(GbError::MalformedTrailer("cannot read /Root"))?;

    // a broken /Info only costs us the document information
    let info = value_after(&window, b"/Info")
        .and_then(|value| indirect_reference(span(value)).ok())
        .map(|(_, id)| id);

    stream.seek(SeekFrom::End(0))?;

    Ok(TrailerState {
        last_start_xref,
        last_xref_size,
        catalog: Some(catalog),
        info,
        xmp: None,
        can_update: false,
    })
}
