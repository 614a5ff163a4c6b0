//! Serialization of PDF objects and xref sections in classic (uncompressed)
//! syntax.

pub(crate) mod object;
pub(crate) mod section;

/// Writes objects the way they are written in a PDF 1.6 file without object
/// or xref streams.
pub struct SimpleEncoder;
