//! Write georeferenced rasters as PDF 1.6 documents.
//!
//! The entry point is [`create_copy`], which streams a [`RasterSource`] into a
//! new file. [`DocumentWriter`] exposes the individual steps, including the
//! incremental update of a file this crate wrote before.

pub use create_copy::{create_copy, CreateCopy};
pub use document::DocumentWriter;
pub use error::{GbError, Result};
pub use options::{Compression, CreateOptions, GeoEncoding, InfoOptions, Margins, UpdateOptions};
pub use progress::{Progress, Silent};
pub use raster::{ColorEntry, DataType, Gcp, GeoTransform, MemRaster, RasterSource, Window};
pub use simple_encode::SimpleEncoder;
pub use srs::{SpatialRefService, WktSpatialRefService};

pub mod create_copy;
pub mod document;
mod error;
pub mod geo;
pub mod image;
pub mod options;
mod page;
pub mod parse;
pub mod pdf;
pub mod progress;
pub mod raster;
pub mod simple_encode;
pub mod srs;
pub mod writer;
