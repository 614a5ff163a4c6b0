use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

use crate::pdf::trailer::TrailerError;

/// Why reading back a document failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GbParseErrorKind {
    #[error("invalid trailer: {0:?}")]
    InvalidTrailer(TrailerError),
    #[error("invalid startxref")]
    StartxrefInvalid,
    #[error("token not found")]
    BackwardSearchNotFound,
    #[error("invalid xref table")]
    XrefInvalid,
    /// The object found at an xref offset carries another number.
    #[error("unexpected object at xref offset")]
    UnexpectedObject,
    #[error("{0:?}")]
    Nom(ErrorKind),
}

impl From<TrailerError> for GbParseErrorKind {
    fn from(err: TrailerError) -> Self {
        GbParseErrorKind::InvalidTrailer(err)
    }
}

/// Parser error carrying the input position and the chain of nom contexts
/// that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GbParseError<I> {
    pub input: I,
    pub kind: GbParseErrorKind,
    pub from: Option<Box<Self>>,
}

impl<I> GbParseError<I> {
    pub fn new(input: I, kind: GbParseErrorKind) -> Self {
        Self { input, kind, from: None }
    }
}

impl<I> ParseError<I> for GbParseError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        Self::new(input, GbParseErrorKind::Nom(kind))
    }

    fn append(input: I, kind: ErrorKind, other: Self) -> Self {
        Self {
            from: Some(Box::new(other)),
            ..Self::new(input, GbParseErrorKind::Nom(kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_the_cause() {
        let inner = GbParseError::new(3, GbParseErrorKind::XrefInvalid);
        let outer = GbParseError::append(1, ErrorKind::Tag, inner.clone());
        assert_eq!(outer.kind, GbParseErrorKind::Nom(ErrorKind::Tag));
        assert_eq!(outer.from.as_deref(), Some(&inner));
        assert_eq!(outer.kind.to_string(), "Tag");
    }
}
