use std::any::Any;
use std::fmt;

use slideset_common::{Cell, ElementKind, PathContext, Subtype, SubtypeSet};

use crate::error::BindingError;
use crate::processed::{Processed, ProcessedType};

/// Static description of a reader.
#[derive(Debug, Clone)]
pub struct ReaderInfo {
    /// Unique registry key, e.g. `integer-i32`.
    pub name: String,
    /// The only cell kind this reader accepts.
    pub kind: ElementKind,
    /// Accepted subtypes; empty (or containing `*`) accepts any.
    pub subtypes: SubtypeSet,
    pub processed: ProcessedType,
    /// Excluded from manual-constant offers, still usable for columns.
    pub hidden: bool,
}

impl ReaderInfo {
    pub fn new<T: Any>(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subtypes: SubtypeSet::any(),
            processed: ProcessedType::of::<T>(),
            hidden: false,
        }
    }

    /// Exact kind match plus subtype acceptance.
    pub fn accepts(&self, kind: ElementKind, subtype: &Subtype) -> bool {
        self.kind == kind && self.subtypes.accepts(subtype)
    }

    /// Subtype given to literal cells built for this reader.
    pub fn constant_subtype(&self) -> Subtype {
        self.subtypes
            .iter()
            .find(|s| !s.is_any())
            .cloned()
            .unwrap_or_else(|| self.kind.default_subtype())
    }
}

/// Static description of a writer.
#[derive(Debug, Clone)]
pub struct WriterInfo {
    pub name: String,
    pub processed: ProcessedType,
    /// Kind of the cells this writer fills.
    pub kind: ElementKind,
    /// Subtype of the column created for this writer's output.
    pub subtype: Subtype,
    /// File extension for generated links, without the dot.
    pub link_extension: Option<String>,
}

impl WriterInfo {
    pub fn new<T: Any>(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            processed: ProcessedType::of::<T>(),
            kind,
            subtype: kind.default_subtype(),
            link_extension: None,
        }
    }
}

/// Converts a cell into a processed value.
///
/// Readers must not depend on anything but the cell and the path context, so
/// reading the same cell twice yields equal values.
pub trait ElementReader: Send + Sync {
    fn info(&self) -> &ReaderInfo;

    fn read(&self, cell: &Cell, ctx: &PathContext) -> Result<Processed, BindingError>;
}

/// Stores a processed value into a cell (and, for file links, to disk).
pub trait ElementWriter: Send + Sync {
    fn info(&self) -> &WriterInfo;

    fn write(&self, value: Processed, cell: &mut Cell, ctx: &PathContext)
    -> Result<(), BindingError>;
}

type ReadFn = dyn Fn(&Cell, &PathContext) -> Result<Processed, BindingError> + Send + Sync;
type WriteFn = dyn Fn(Processed, &mut Cell, &PathContext) -> Result<(), BindingError> + Send + Sync;

/// Reader backed by a closure.
pub struct FnReader {
    info: ReaderInfo,
    read: Box<ReadFn>,
}

impl FnReader {
    pub fn new<T, F>(name: impl Into<String>, kind: ElementKind, f: F) -> Self
    where
        T: Any + Send,
        F: Fn(&Cell, &PathContext) -> Result<T, BindingError> + Send + Sync + 'static,
    {
        Self {
            info: ReaderInfo::new::<T>(name, kind),
            read: Box::new(move |cell, ctx| f(cell, ctx).map(Processed::new)),
        }
    }

    pub fn with_subtypes(mut self, subtypes: SubtypeSet) -> Self {
        self.info.subtypes = subtypes;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.info.hidden = true;
        self
    }
}

impl ElementReader for FnReader {
    fn info(&self) -> &ReaderInfo {
        &self.info
    }

    fn read(&self, cell: &Cell, ctx: &PathContext) -> Result<Processed, BindingError> {
        check_kind(&self.info.name, self.info.kind, cell)?;
        (self.read)(cell, ctx)
    }
}

impl fmt::Debug for FnReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReader").field("info", &self.info).finish()
    }
}

/// Writer backed by a closure over the concrete processed type.
pub struct FnWriter {
    info: WriterInfo,
    write: Box<WriteFn>,
}

impl FnWriter {
    pub fn new<T, F>(name: impl Into<String>, kind: ElementKind, f: F) -> Self
    where
        T: Any + Send,
        F: Fn(T, &mut Cell, &PathContext) -> Result<(), BindingError> + Send + Sync + 'static,
    {
        Self {
            info: WriterInfo::new::<T>(name, kind),
            write: Box::new(move |value, cell, ctx| f(value.downcast::<T>()?, cell, ctx)),
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<Subtype>) -> Self {
        self.info.subtype = subtype.into();
        self
    }

    pub fn with_link_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.info.link_extension = Some(extension.trim_start_matches('.').to_string());
        self
    }
}

impl ElementWriter for FnWriter {
    fn info(&self) -> &WriterInfo {
        &self.info
    }

    fn write(
        &self,
        value: Processed,
        cell: &mut Cell,
        ctx: &PathContext,
    ) -> Result<(), BindingError> {
        check_kind(&self.info.name, self.info.kind, cell)?;
        (self.write)(value, cell, ctx)
    }
}

impl fmt::Debug for FnWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnWriter").field("info", &self.info).finish()
    }
}

fn check_kind(adapter: &str, expected: ElementKind, cell: &Cell) -> Result<(), BindingError> {
    if cell.kind() == expected {
        Ok(())
    } else {
        Err(BindingError::CellKind {
            adapter: adapter.to_string(),
            expected,
            found: cell.kind(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slideset_common::Underlying;

    #[test]
    fn fn_reader_rejects_other_kinds() {
        let reader = FnReader::new("len", ElementKind::Text, |cell, _| {
            Ok(cell.text().len())
        });
        let ctx = PathContext::default();
        let cell = Cell::with_value(Underlying::from("abc"), Subtype::new(Subtype::TEXT));
        let value = reader.read(&cell, &ctx).unwrap();
        assert_eq!(value.downcast::<usize>().unwrap(), 3);

        let wrong = Cell::with_value(Underlying::from(3i64), Subtype::new(Subtype::INTEGER));
        assert!(matches!(
            reader.read(&wrong, &ctx),
            Err(BindingError::CellKind { found: ElementKind::Integer, .. })
        ));
    }

    #[test]
    fn fn_writer_downcasts_before_writing() {
        let writer = FnWriter::new("int", ElementKind::Integer, |v: i64, cell: &mut Cell, _| {
            Ok(cell.set_value(v)?)
        });
        let ctx = PathContext::default();
        let mut cell = Cell::new(ElementKind::Integer, Subtype::new(Subtype::INTEGER));
        writer.write(Processed::new(7i64), &mut cell, &ctx).unwrap();
        assert_eq!(cell.text(), "7");
        assert!(matches!(
            writer.write(Processed::new("x".to_string()), &mut cell, &ctx),
            Err(BindingError::ProcessedTypeMismatch { .. })
        ));
        assert_eq!(cell.text(), "7");
    }

    #[test]
    fn constant_subtype_skips_wildcards() {
        let info = ReaderInfo::new::<String>("t", ElementKind::FileLink);
        assert_eq!(info.constant_subtype(), ElementKind::FileLink.default_subtype());
        let mut info = info;
        info.subtypes = SubtypeSet::of(["*", "text/plain"]);
        assert_eq!(info.constant_subtype(), "text/plain");
    }
}
