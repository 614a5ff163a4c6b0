use thiserror::Error;

use crate::{
    parse::error::{GbParseError, GbParseErrorKind},
    pdf::ObjectId,
};

#[derive(Debug, Error)]
pub enum GbError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed trailer: {0}")]
    MalformedTrailer(&'static str),
    #[error("parse error: {0}")]
    Parse(GbParseErrorKind),
    #[error("object {0} not found")]
    MissingObject(ObjectId),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("invalid source: {0}")]
    InvalidSource(String),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("user cancelled")]
    Cancelled,
    #[error("codec error: {0}")]
    Codec(String),
    #[error("raster error: {0}")]
    Raster(String),
}

impl<I> From<nom::Err<GbParseError<I>>> for GbError {
    fn from(err: nom::Err<GbParseError<I>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => GbError::Parse(GbParseErrorKind::Nom(nom::error::ErrorKind::Complete)),
            nom::Err::Error(e) | nom::Err::Failure(e) => GbError::Parse(e.kind),
        }
    }
}

pub type Result<T> = std::result::Result<T, GbError>;
