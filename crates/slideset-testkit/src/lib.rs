//! Fixture tables and scratch directories shared by SlideSet tests.

use std::path::{Path, PathBuf};

use slideset_common::{Cell, ElementKind, Subtype};
use slideset_table::{ColumnMeta, Table};
pub use tempfile::TempDir;

/// A fresh scratch directory, removed on drop.
pub fn tempdir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Write `contents` to `dir/rel`, creating parent directories.
pub fn write_file(dir: &Path, rel: impl AsRef<Path>, contents: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dirs");
    }
    std::fs::write(&path, contents).expect("write fixture file");
    path
}

/// Build a column of cells from their text form.
pub fn cells(kind: ElementKind, subtype: &Subtype, texts: &[&str]) -> Vec<Cell> {
    texts
        .iter()
        .map(|t| Cell::from_text(kind, subtype.clone(), t).expect("fixture cell text"))
        .collect()
}

/// Add a column to `table` from text values, using the kind's default subtype
/// unless `subtype` is given.
pub fn push_column(
    table: &mut Table,
    name: &str,
    kind: ElementKind,
    subtype: Option<&str>,
    texts: &[&str],
) -> usize {
    let subtype = subtype.map(Subtype::new).unwrap_or_else(|| kind.default_subtype());
    let meta = ColumnMeta::new(name, kind).with_subtype(subtype.clone());
    table
        .add_column_with_cells(meta, cells(kind, &subtype, texts))
        .expect("fixture column")
}

/// A table with a single integer column `Count` holding `values`.
pub fn counts_table(values: &[i64]) -> Table {
    let texts: Vec<String> = values.iter().map(i64::to_string).collect();
    let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
    let mut table = Table::new("counts");
    push_column(&mut table, "Count", ElementKind::Integer, None, &texts);
    table
}

/// A three-row table with one column of every kind:
///
/// | Flag | Count | Area | Label | Notes (text/plain) | Mask (image) |
pub fn mixed_table() -> Table {
    let mut table = Table::new("mixed");
    push_column(&mut table, "Flag", ElementKind::Logical, None, &["true", "false", "1"]);
    push_column(&mut table, "Count", ElementKind::Integer, None, &["1", "2", "3"]);
    push_column(&mut table, "Area", ElementKind::Numeric, None, &["0.5", "1.5", "2.5"]);
    push_column(&mut table, "Label", ElementKind::Text, None, &["a", "b", "c"]);
    push_column(
        &mut table,
        "Notes",
        ElementKind::FileLink,
        Some(Subtype::TEXT_PLAIN),
        &["notes/a.txt", "notes/b.txt", "notes/c.txt"],
    );
    push_column(
        &mut table,
        "Mask",
        ElementKind::FileLink,
        Some(Subtype::IMAGE),
        &["", "", ""],
    );
    table
}
