use std::sync::Arc;

use slideset_common::{Cell, ElementKind, PathContext};
use slideset_table::Table;

use crate::adapter::{ElementReader, ElementWriter};
use crate::error::BindingError;
use crate::processed::Processed;

/// A reader bound to one column of a table.
pub struct ColumnBoundReader<'t> {
    table: &'t Table,
    column: usize,
    reader: Arc<dyn ElementReader>,
    ctx: PathContext,
}

impl<'t> ColumnBoundReader<'t> {
    pub fn new(table: &'t Table, column: usize, reader: Arc<dyn ElementReader>) -> Self {
        Self {
            table,
            column,
            reader,
            ctx: table.path_context(),
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn reader(&self) -> &Arc<dyn ElementReader> {
        &self.reader
    }

    pub fn read(&self, row: usize) -> Result<Processed, BindingError> {
        let cell = self.table.cell(self.column, row)?;
        self.reader.read(cell, &self.ctx)
    }
}

/// A reader bound to one literal cell. The row is ignored.
pub struct ConstantReader {
    cell: Cell,
    reader: Arc<dyn ElementReader>,
    ctx: PathContext,
}

impl ConstantReader {
    pub fn new(cell: Cell, reader: Arc<dyn ElementReader>, ctx: PathContext) -> Self {
        Self { cell, reader, ctx }
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn read(&self, _row: usize) -> Result<Processed, BindingError> {
        self.reader.read(&self.cell, &self.ctx)
    }
}

/// A row-callable input: either a column or a constant.
pub enum InputBinding<'t> {
    Column(ColumnBoundReader<'t>),
    Constant(ConstantReader),
}

impl InputBinding<'_> {
    pub fn read(&self, row: usize) -> Result<Processed, BindingError> {
        match self {
            InputBinding::Column(b) => b.read(row),
            InputBinding::Constant(b) => b.read(row),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, InputBinding::Constant(_))
    }
}

/// A writer bound to a column of the result table.
pub struct ColumnBoundWriter {
    column: usize,
    writer: Arc<dyn ElementWriter>,
}

impl ColumnBoundWriter {
    pub fn new(column: usize, writer: Arc<dyn ElementWriter>) -> Self {
        Self { column, writer }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Write `value` into `row`. Empty file-link cells get a default link
    /// first. The cell and the column's link counter only change when the
    /// writer succeeds.
    pub fn write(&self, table: &mut Table, row: usize, value: Processed) -> Result<(), BindingError> {
        let ctx = table.path_context();
        let writer = &self.writer;
        if writer.info().kind == ElementKind::FileLink {
            table.update_linked_cell(self.column, row, |cell| writer.write(value, cell, &ctx))
        } else {
            table.update_cell(self.column, row, |cell| writer.write(value, cell, &ctx))
        }
    }
}
