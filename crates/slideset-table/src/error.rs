use std::io;
use std::path::PathBuf;

use slideset_common::{ElementError, ElementKind, Subtype};
use thiserror::Error;

use crate::TableId;

/// Failures while generating, reading, or writing linked files.
///
/// Kept apart from plain I/O so callers can tell "path not configured" from
/// "file not found" from "write failed".
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("column `{column}` has no default link path configured")]
    NoDefaultPath { column: String },

    #[error("column `{column}` holds {kind} values, not file links")]
    NotAFileLink { column: String, kind: ElementKind },

    #[error("linked file `{}` does not exist", .path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to write linked file `{}`: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no unused link name for column `{column}` after {attempts} attempts")]
    ProbeExhausted { column: String, attempts: u32 },
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column index {index} out of bounds (table has {len} columns)")]
    ColumnIndex { index: usize, len: usize },

    #[error("row index {index} out of bounds (table has {len} rows)")]
    RowIndex { index: usize, len: usize },

    #[error("no column named `{name}`")]
    UnknownColumn { name: String },

    #[error("column name cannot be empty")]
    EmptyColumnName,

    #[error("table `{table}` has no columns to add a row to")]
    NoColumns { table: String },

    #[error("expected {expected} cells, got {found}")]
    CellCount { expected: usize, found: usize },

    #[error("column `{column}` holds {expected} values, got {found}{}", row_suffix(.row))]
    KindMismatch {
        column: String,
        row: Option<usize>,
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("column `{column}` has subtype `{expected}`, got `{found}`{}", row_suffix(.row))]
    SubtypeMismatch {
        column: String,
        row: Option<usize>,
        expected: Subtype,
        found: Subtype,
    },

    #[error("cannot convert column `{column}` at row {row}: {source}")]
    Conversion {
        column: String,
        row: usize,
        #[source]
        source: ElementError,
    },

    #[error("unknown table id {id}")]
    UnknownTable { id: TableId },

    #[error("table `{name}` still has {children} child table(s); detach them first")]
    HasChildren { name: String, children: usize },

    #[error(transparent)]
    Element(#[from] ElementError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(r) => format!(" at row {r}"),
        None => String::new(),
    }
}
