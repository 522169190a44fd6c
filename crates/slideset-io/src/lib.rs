//! Persistence for SlideSet tables.
//!
//! A whole [`TableTree`](slideset_table::TableTree) is stored as one JSON
//! document (see [`document`]); single tables can be exchanged as CSV.

pub mod backends;
pub mod document;
pub mod error;

pub use document::{
    ColumnDocument, CreationDocument, DOCUMENT_VERSION, LinkDocument, TableDocument, TreeDocument,
};
pub use error::IoError;

#[cfg(feature = "csv")]
pub use backends::csv::{
    CsvNewline, CsvQuoteStyle, CsvReadOptions, CsvTrim, CsvTypeInference, CsvWriteOptions,
};
#[cfg(feature = "json")]
pub use backends::json::{JsonAdapter, JsonWriteOptions};

use std::io::Write;
use std::path::Path;

/// Where a backend writes its output.
pub enum SaveDestination<'a> {
    /// Back to the path the data was opened from.
    InPlace,
    Path(&'a Path),
    Writer(&'a mut dyn Write),
    /// Return the encoded bytes.
    Bytes,
}
