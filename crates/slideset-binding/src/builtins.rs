//! Primitive adapters between cell kinds and plain Rust values.
//!
//! | reader        | kind      | subtypes     | yields    |
//! |---------------|-----------|--------------|-----------|
//! | `logical`     | logical   | any          | `bool`    |
//! | `logical-int` | logical   | any (hidden) | `i32`     |
//! | `integer-*`   | integer   | any          | `i8`..`f64` |
//! | `numeric-*`   | numeric   | any          | `f64`, `f32` |
//! | `text`        | text      | any          | `String`  |
//! | `file-path`   | file-link | any          | `PathBuf` |
//! | `text-file`   | file-link | `text/plain` | `String`  |

use std::io::ErrorKind;
use std::path::PathBuf;

use slideset_common::{Cell, ElementKind, PathContext, Subtype, SubtypeSet, Underlying};
use slideset_table::LinkError;

use crate::adapter::{FnReader, FnWriter};
use crate::error::BindingError;
use crate::registry::AdapterRegistry;

pub const LOGICAL: &str = "logical";
pub const LOGICAL_INT: &str = "logical-int";
pub const INTEGER_I8: &str = "integer-i8";
pub const INTEGER_I16: &str = "integer-i16";
pub const INTEGER_I32: &str = "integer-i32";
pub const INTEGER_I64: &str = "integer-i64";
pub const INTEGER_F32: &str = "integer-f32";
pub const INTEGER_F64: &str = "integer-f64";
pub const NUMERIC_F64: &str = "numeric-f64";
pub const NUMERIC_F32: &str = "numeric-f32";
pub const TEXT: &str = "text";
pub const FILE_PATH: &str = "file-path";
pub const TEXT_FILE: &str = "text-file";

pub fn register_builtins(registry: &mut AdapterRegistry) {
    register_readers(registry);
    register_writers(registry);
}

fn register_readers(registry: &mut AdapterRegistry) {
    registry.register_reader(FnReader::new(LOGICAL, ElementKind::Logical, |cell, _| {
        logical(cell)
    }));
    registry.register_reader(
        FnReader::new(LOGICAL_INT, ElementKind::Logical, |cell, _| {
            Ok(i32::from(logical(cell)?))
        })
        .hidden(),
    );

    registry.register_reader(FnReader::new(INTEGER_I8, ElementKind::Integer, |cell, _| {
        narrow::<i8>(integer(cell)?, "i8")
    }));
    registry.register_reader(FnReader::new(INTEGER_I16, ElementKind::Integer, |cell, _| {
        narrow::<i16>(integer(cell)?, "i16")
    }));
    registry.register_reader(FnReader::new(INTEGER_I32, ElementKind::Integer, |cell, _| {
        narrow::<i32>(integer(cell)?, "i32")
    }));
    registry.register_reader(FnReader::new(INTEGER_I64, ElementKind::Integer, |cell, _| {
        integer(cell)
    }));
    registry.register_reader(FnReader::new(INTEGER_F32, ElementKind::Integer, |cell, _| {
        Ok(integer(cell)? as f32)
    }));
    registry.register_reader(FnReader::new(INTEGER_F64, ElementKind::Integer, |cell, _| {
        Ok(integer(cell)? as f64)
    }));

    registry.register_reader(FnReader::new(NUMERIC_F64, ElementKind::Numeric, |cell, _| {
        numeric(cell)
    }));
    registry.register_reader(FnReader::new(NUMERIC_F32, ElementKind::Numeric, |cell, _| {
        Ok(numeric(cell)? as f32)
    }));

    registry.register_reader(FnReader::new(TEXT, ElementKind::Text, |cell, _| {
        Ok(cell.text())
    }));

    registry.register_reader(FnReader::new(
        FILE_PATH,
        ElementKind::FileLink,
        |cell, ctx| -> Result<PathBuf, BindingError> { Ok(ctx.resolve(link(FILE_PATH, cell)?)) },
    ));
    registry.register_reader(
        FnReader::new(TEXT_FILE, ElementKind::FileLink, |cell, ctx| {
            let path = ctx.resolve(link(TEXT_FILE, cell)?);
            std::fs::read_to_string(&path).map_err(|err| match err.kind() {
                ErrorKind::NotFound => LinkError::MissingFile { path }.into(),
                _ => BindingError::Io(err),
            })
        })
        .with_subtypes(SubtypeSet::of([Subtype::TEXT_PLAIN])),
    );
}

fn register_writers(registry: &mut AdapterRegistry) {
    registry.register_writer(FnWriter::new(
        LOGICAL,
        ElementKind::Logical,
        |v: bool, cell: &mut Cell, _: &PathContext| Ok(cell.set_value(v)?),
    ));
    registry.register_writer(FnWriter::new(
        INTEGER_I32,
        ElementKind::Integer,
        |v: i32, cell: &mut Cell, _: &PathContext| Ok(cell.set_value(v)?),
    ));
    registry.register_writer(FnWriter::new(
        INTEGER_I64,
        ElementKind::Integer,
        |v: i64, cell: &mut Cell, _: &PathContext| Ok(cell.set_value(v)?),
    ));
    registry.register_writer(FnWriter::new(
        NUMERIC_F64,
        ElementKind::Numeric,
        |v: f64, cell: &mut Cell, _: &PathContext| Ok(cell.set_value(v)?),
    ));
    registry.register_writer(FnWriter::new(
        TEXT,
        ElementKind::Text,
        |v: String, cell: &mut Cell, _: &PathContext| Ok(cell.set_value(v)?),
    ));
    registry.register_writer(
        FnWriter::new(
            TEXT_FILE,
            ElementKind::FileLink,
            |v: String, cell: &mut Cell, ctx: &PathContext| {
                let path = ctx.resolve(link(TEXT_FILE, cell)?);
                write_file(&path, v.as_bytes())
            },
        )
        .with_subtype(Subtype::TEXT_PLAIN)
        .with_link_extension("txt"),
    );
}

fn logical(cell: &Cell) -> Result<bool, BindingError> {
    match cell.value() {
        Underlying::Logical(v) => Ok(*v),
        other => Err(kind_error(LOGICAL, ElementKind::Logical, other.kind())),
    }
}

fn integer(cell: &Cell) -> Result<i64, BindingError> {
    match cell.value() {
        Underlying::Integer(v) => Ok(*v),
        other => Err(kind_error(INTEGER_I64, ElementKind::Integer, other.kind())),
    }
}

fn numeric(cell: &Cell) -> Result<f64, BindingError> {
    match cell.value() {
        Underlying::Numeric(v) => Ok(*v),
        other => Err(kind_error(NUMERIC_F64, ElementKind::Numeric, other.kind())),
    }
}

fn link<'c>(adapter: &str, cell: &'c Cell) -> Result<&'c std::path::Path, BindingError> {
    cell.link().ok_or_else(|| BindingError::EmptyLink {
        adapter: adapter.to_string(),
    })
}

fn narrow<T: TryFrom<i64>>(value: i64, target: &'static str) -> Result<T, BindingError> {
    T::try_from(value).map_err(|_| BindingError::OutOfRange {
        value: value.to_string(),
        target,
    })
}

fn kind_error(adapter: &str, expected: ElementKind, found: ElementKind) -> BindingError {
    BindingError::CellKind {
        adapter: adapter.to_string(),
        expected,
        found,
    }
}

fn write_file(path: &std::path::Path, contents: &[u8]) -> Result<(), BindingError> {
    let result = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
    .and_then(|_| std::fs::write(path, contents));
    result.map_err(|source| {
        LinkError::CreateFailed {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processed::Processed;

    fn cell(kind: ElementKind, text: &str) -> Cell {
        Cell::from_text(kind, kind.default_subtype(), text).unwrap()
    }

    #[test]
    fn integer_narrowing_reports_overflow() {
        let reg = AdapterRegistry::with_builtins();
        let ctx = PathContext::default();
        let big = cell(ElementKind::Integer, "300");

        let as_i16 = reg.reader(INTEGER_I16).unwrap().read(&big, &ctx).unwrap();
        assert_eq!(as_i16.downcast::<i16>().unwrap(), 300);
        assert!(matches!(
            reg.reader(INTEGER_I8).unwrap().read(&big, &ctx),
            Err(BindingError::OutOfRange { target: "i8", .. })
        ));
    }

    #[test]
    fn logical_int_is_hidden_but_readable() {
        let reg = AdapterRegistry::with_builtins();
        let reader = reg.reader(LOGICAL_INT).unwrap();
        assert!(reader.info().hidden);
        let value = reader
            .read(&cell(ElementKind::Logical, "true"), &PathContext::default())
            .unwrap();
        assert_eq!(value.downcast::<i32>().unwrap(), 1);
    }

    #[test]
    fn text_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PathContext::new(Some(dir.path().to_path_buf()));
        let reg = AdapterRegistry::with_builtins();

        let mut link = Cell::from_text(
            ElementKind::FileLink,
            Subtype::new(Subtype::TEXT_PLAIN),
            "notes/a.txt",
        )
        .unwrap();
        reg.writer(TEXT_FILE)
            .unwrap()
            .write(Processed::new("hello".to_string()), &mut link, &ctx)
            .unwrap();
        assert!(dir.path().join("notes/a.txt").is_file());

        let read = reg.reader(TEXT_FILE).unwrap().read(&link, &ctx).unwrap();
        assert_eq!(read.downcast::<String>().unwrap(), "hello");
    }

    #[test]
    fn text_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PathContext::new(Some(dir.path().to_path_buf()));
        let link = Cell::from_text(
            ElementKind::FileLink,
            Subtype::new(Subtype::TEXT_PLAIN),
            "absent.txt",
        )
        .unwrap();
        let err = AdapterRegistry::with_builtins()
            .reader(TEXT_FILE)
            .unwrap()
            .read(&link, &ctx)
            .unwrap_err();
        assert!(matches!(
            err.as_link_error(),
            Some(LinkError::MissingFile { .. })
        ));
    }

    #[test]
    fn file_path_requires_a_link() {
        let empty = Cell::new(ElementKind::FileLink, ElementKind::FileLink.default_subtype());
        assert!(matches!(
            AdapterRegistry::with_builtins()
                .reader(FILE_PATH)
                .unwrap()
                .read(&empty, &PathContext::default()),
            Err(BindingError::EmptyLink { .. })
        ));
    }
}
