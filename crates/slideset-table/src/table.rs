use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use slideset_common::{Cell, ElementKind, PathContext, Subtype, Underlying};

use crate::column::{ColumnMeta, LinkDefaults};
use crate::error::TableError;
use crate::link::LinkPolicy;

/// Record of the command that produced a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationInfo {
    pub command: String,
    /// Parameter name → description of the column or constant bound to it.
    pub parameters: BTreeMap<String, String>,
    pub created: DateTime<Utc>,
}

impl CreationInfo {
    pub fn new(command: impl Into<String>, parameters: BTreeMap<String, String>) -> Self {
        Self {
            command: command.into(),
            parameters,
            created: Utc::now(),
        }
    }
}

/// Ordered set of named, typed columns sharing one row count.
///
/// Every structural operation is all-or-nothing: on error the table is left
/// exactly as it was. Column and row indices are bounds-checked and reported
/// as [`TableError::ColumnIndex`] / [`TableError::RowIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<ColumnMeta>,
    data: Vec<Vec<Cell>>,
    rows: usize,
    working_dir: Option<PathBuf>,
    creation: Option<CreationInfo>,
    link_policy: LinkPolicy,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            data: Vec::new(),
            rows: 0,
            working_dir: None,
            creation: None,
            link_policy: LinkPolicy::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Result<&ColumnMeta, TableError> {
        self.check_column(index)?;
        Ok(&self.columns[index])
    }

    /// Index of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name).ok_or_else(|| TableError::UnknownColumn {
            name: name.to_string(),
        })
    }

    pub fn column_cells(&self, index: usize) -> Result<&[Cell], TableError> {
        self.check_column(index)?;
        Ok(&self.data[index])
    }

    pub fn cell(&self, column: usize, row: usize) -> Result<&Cell, TableError> {
        self.check_cell(column, row)?;
        Ok(&self.data[column][row])
    }

    pub fn cell_text(&self, column: usize, row: usize) -> Result<String, TableError> {
        self.cell(column, row).map(Cell::text)
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Set this table's working directory only. Use
    /// `TableTree::set_working_dir_recursive` to update a whole subtree.
    pub fn set_working_dir(&mut self, dir: Option<PathBuf>) {
        self.working_dir = dir;
    }

    pub fn path_context(&self) -> PathContext {
        PathContext::new(self.working_dir.clone())
    }

    pub fn creation(&self) -> Option<&CreationInfo> {
        self.creation.as_ref()
    }

    pub fn set_creation(&mut self, creation: Option<CreationInfo>) {
        self.creation = creation;
    }

    pub fn link_policy(&self) -> &LinkPolicy {
        &self.link_policy
    }

    pub fn set_link_policy(&mut self, policy: LinkPolicy) {
        self.link_policy = policy;
    }

    /* ───────────────────────── Columns ───────────────────────── */

    /// Append a column, back-filling one default cell per existing row.
    pub fn add_column(&mut self, meta: ColumnMeta) -> Result<usize, TableError> {
        Self::check_meta(&meta)?;
        let cells = vec![Cell::new(meta.kind, meta.subtype.clone()); self.rows];
        Ok(self.push_column(meta, cells))
    }

    /// Append a column with explicit cells.
    ///
    /// `cells.len()` must equal the row count, unless the table has no
    /// columns yet, in which case the new column sets the row count.
    pub fn add_column_with_cells(
        &mut self,
        meta: ColumnMeta,
        cells: Vec<Cell>,
    ) -> Result<usize, TableError> {
        Self::check_meta(&meta)?;
        if !self.columns.is_empty() && cells.len() != self.rows {
            return Err(TableError::CellCount {
                expected: self.rows,
                found: cells.len(),
            });
        }
        for (row, cell) in cells.iter().enumerate() {
            Self::check_cell_against(&meta, cell, Some(row))?;
        }
        if self.columns.is_empty() {
            self.rows = cells.len();
        }
        Ok(self.push_column(meta, cells))
    }

    /// Remove a column and its cells. Later columns shift down by one, so
    /// batch removals must go from the highest index to the lowest; see
    /// [`Table::remove_columns`].
    pub fn remove_column(&mut self, index: usize) -> Result<ColumnMeta, TableError> {
        self.check_column(index)?;
        self.data.remove(index);
        let meta = self.columns.remove(index);
        if self.columns.is_empty() {
            self.rows = 0;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(table = %self.name, column = %meta.name, "removed column");
        Ok(meta)
    }

    /// Remove several columns, highest index first.
    pub fn remove_columns(&mut self, indices: &[usize]) -> Result<Vec<ColumnMeta>, TableError> {
        for &index in indices {
            self.check_column(index)?;
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        let mut removed = Vec::with_capacity(sorted.len());
        for index in sorted {
            removed.push(self.remove_column(index)?);
        }
        Ok(removed)
    }

    pub fn rename_column(&mut self, index: usize, name: impl Into<String>) -> Result<(), TableError> {
        self.check_column(index)?;
        let name = name.into();
        if name.is_empty() {
            return Err(TableError::EmptyColumnName);
        }
        self.columns[index].name = name;
        Ok(())
    }

    /// Change a column's subtype, updating every cell in it.
    pub fn set_column_subtype(&mut self, index: usize, subtype: Subtype) -> Result<(), TableError> {
        self.check_column(index)?;
        for cell in &mut self.data[index] {
            cell.set_subtype(subtype.clone());
        }
        self.columns[index].subtype = subtype;
        Ok(())
    }

    pub fn set_link_defaults(&mut self, index: usize, link: LinkDefaults) -> Result<(), TableError> {
        self.check_column(index)?;
        self.columns[index].link = link;
        Ok(())
    }

    pub fn set_column_extra(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TableError> {
        self.check_column(index)?;
        self.columns[index].extra.insert(key.into(), value.into());
        Ok(())
    }

    /// Re-type a column in place by round-tripping every cell through text.
    ///
    /// Each cell is serialized under the old kind and parsed under
    /// `kind`. The converted cells are built aside and swapped in only when
    /// every row parsed; otherwise the column is left untouched and the
    /// first failing row is reported. Values the new kind cannot express are
    /// not coerced: `"37.5"` does not become an integer.
    pub fn convert_column(
        &mut self,
        index: usize,
        kind: ElementKind,
        subtype: Subtype,
    ) -> Result<(), TableError> {
        self.check_column(index)?;
        let mut converted = Vec::with_capacity(self.rows);
        for (row, cell) in self.data[index].iter().enumerate() {
            let text = cell.text();
            let cell = Cell::from_text(kind, subtype.clone(), &text).map_err(|source| {
                TableError::Conversion {
                    column: self.columns[index].name.clone(),
                    row,
                    source,
                }
            })?;
            converted.push(cell);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            table = %self.name,
            column = %self.columns[index].name,
            from = %self.columns[index].kind,
            to = %kind,
            "converted column"
        );

        let meta = &mut self.columns[index];
        meta.kind = kind;
        meta.subtype = subtype;
        self.data[index] = converted;
        Ok(())
    }

    /* ─────────────────────────── Rows ─────────────────────────── */

    /// Append one default-valued cell to every column.
    pub fn add_row(&mut self) -> Result<usize, TableError> {
        if self.columns.is_empty() {
            return Err(TableError::NoColumns {
                table: self.name.clone(),
            });
        }
        for (meta, cells) in self.columns.iter().zip(self.data.iter_mut()) {
            cells.push(Cell::new(meta.kind, meta.subtype.clone()));
        }
        self.rows += 1;
        self.debug_check_shape();
        Ok(self.rows - 1)
    }

    /// Append a row of explicit cells, one per column, in column order.
    pub fn add_row_with_cells(&mut self, cells: Vec<Cell>) -> Result<usize, TableError> {
        if self.columns.is_empty() {
            return Err(TableError::NoColumns {
                table: self.name.clone(),
            });
        }
        if cells.len() != self.columns.len() {
            return Err(TableError::CellCount {
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        for (meta, cell) in self.columns.iter().zip(&cells) {
            Self::check_cell_against(meta, cell, Some(self.rows))?;
        }
        for (column, cell) in self.data.iter_mut().zip(cells) {
            column.push(cell);
        }
        self.rows += 1;
        self.debug_check_shape();
        Ok(self.rows - 1)
    }

    /// Remove a row from every column. Later rows shift up by one; see
    /// [`Table::remove_rows`] for batches.
    pub fn remove_row(&mut self, index: usize) -> Result<(), TableError> {
        self.check_row(index)?;
        for column in &mut self.data {
            column.remove(index);
        }
        self.rows -= 1;
        self.debug_check_shape();
        Ok(())
    }

    /// Remove several rows, highest index first.
    pub fn remove_rows(&mut self, indices: &[usize]) -> Result<(), TableError> {
        for &index in indices {
            self.check_row(index)?;
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        for index in sorted {
            self.remove_row(index)?;
        }
        Ok(())
    }

    /* ─────────────────────────── Cells ─────────────────────────── */

    pub fn set_cell_value(
        &mut self,
        column: usize,
        row: usize,
        value: impl Into<Underlying>,
    ) -> Result<(), TableError> {
        self.check_cell(column, row)?;
        let value = value.into();
        let meta = &self.columns[column];
        if value.kind() != meta.kind {
            return Err(TableError::KindMismatch {
                column: meta.name.clone(),
                row: Some(row),
                expected: meta.kind,
                found: value.kind(),
            });
        }
        self.data[column][row].set_value(value)?;
        Ok(())
    }

    /// Parse `text` into a cell under the column's kind.
    pub fn set_cell_text(&mut self, column: usize, row: usize, text: &str) -> Result<(), TableError> {
        self.check_cell(column, row)?;
        self.data[column][row].set_text(text)?;
        Ok(())
    }

    /// Mutate a cell through a closure, typically an adapter writing into
    /// it. The closure works on a copy; the copy is committed only if the
    /// closure succeeds and the cell still matches the column's kind and
    /// subtype.
    pub fn update_cell<E, F>(&mut self, column: usize, row: usize, f: F) -> Result<(), E>
    where
        E: From<TableError>,
        F: FnOnce(&mut Cell) -> Result<(), E>,
    {
        self.check_cell(column, row)?;
        let mut cell = self.data[column][row].clone();
        f(&mut cell)?;
        Self::check_cell_against(&self.columns[column], &cell, Some(row))?;
        self.data[column][row] = cell;
        Ok(())
    }

    /* ───────────────────────── Internals ───────────────────────── */

    pub(crate) fn replace_cell(&mut self, column: usize, row: usize, cell: Cell) {
        debug_assert!(cell.is_compatible(self.columns[column].kind, &self.columns[column].subtype));
        self.data[column][row] = cell;
    }

    pub(crate) fn column_link_mut(&mut self, column: usize) -> &mut LinkDefaults {
        &mut self.columns[column].link
    }

    fn push_column(&mut self, meta: ColumnMeta, cells: Vec<Cell>) -> usize {
        #[cfg(feature = "tracing")]
        tracing::debug!(table = %self.name, column = %meta.name, kind = %meta.kind, "added column");
        self.columns.push(meta);
        self.data.push(cells);
        self.debug_check_shape();
        self.columns.len() - 1
    }

    fn check_meta(meta: &ColumnMeta) -> Result<(), TableError> {
        if meta.name.is_empty() {
            Err(TableError::EmptyColumnName)
        } else {
            Ok(())
        }
    }

    pub(crate) fn check_cell_against(meta: &ColumnMeta, cell: &Cell, row: Option<usize>) -> Result<(), TableError> {
        if cell.kind() != meta.kind {
            return Err(TableError::KindMismatch {
                column: meta.name.clone(),
                row,
                expected: meta.kind,
                found: cell.kind(),
            });
        }
        if cell.subtype() != &meta.subtype {
            return Err(TableError::SubtypeMismatch {
                column: meta.name.clone(),
                row,
                expected: meta.subtype.clone(),
                found: cell.subtype().clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_column(&self, index: usize) -> Result<(), TableError> {
        if index < self.columns.len() {
            Ok(())
        } else {
            Err(TableError::ColumnIndex {
                index,
                len: self.columns.len(),
            })
        }
    }

    pub(crate) fn check_row(&self, index: usize) -> Result<(), TableError> {
        if index < self.rows {
            Ok(())
        } else {
            Err(TableError::RowIndex {
                index,
                len: self.rows,
            })
        }
    }

    pub(crate) fn check_cell(&self, column: usize, row: usize) -> Result<(), TableError> {
        self.check_column(column)?;
        self.check_row(row)
    }

    #[inline]
    fn debug_check_shape(&self) {
        debug_assert_eq!(self.columns.len(), self.data.len());
        debug_assert!(self.data.iter().all(|c| c.len() == self.rows));
        debug_assert!(!self.columns.is_empty() || self.rows == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> Table {
        let mut table = Table::new("counts");
        table
            .add_column(ColumnMeta::new("Count", ElementKind::Integer))
            .unwrap();
        table
    }

    #[test]
    fn add_row_back_fills_defaults() {
        let mut table = counts();
        for _ in 0..3 {
            table.add_row().unwrap();
        }
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_cells(0).unwrap().len(), 3);

        let label = table
            .add_column(ColumnMeta::new("Label", ElementKind::Text))
            .unwrap();
        assert_eq!(table.column_cells(label).unwrap().len(), 3);
        assert_eq!(table.cell_text(label, 2).unwrap(), "");
    }

    #[test]
    fn add_row_without_columns_fails() {
        let mut table = Table::new("empty");
        assert!(matches!(table.add_row(), Err(TableError::NoColumns { .. })));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn add_column_rejects_empty_name() {
        let mut table = Table::new("t");
        let err = table
            .add_column(ColumnMeta::new("", ElementKind::Text))
            .unwrap_err();
        assert!(matches!(err, TableError::EmptyColumnName));
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn add_column_with_cells_bootstraps_row_count() {
        let mut table = Table::new("t");
        let meta = ColumnMeta::new("Flag", ElementKind::Logical);
        let cells = vec![Cell::new(ElementKind::Logical, meta.subtype.clone()); 4];
        table.add_column_with_cells(meta, cells).unwrap();
        assert_eq!(table.row_count(), 4);

        let meta = ColumnMeta::new("Other", ElementKind::Logical);
        let cells = vec![Cell::new(ElementKind::Logical, meta.subtype.clone()); 2];
        let err = table.add_column_with_cells(meta, cells).unwrap_err();
        assert!(matches!(err, TableError::CellCount { expected: 4, found: 2 }));
        assert_eq!(table.column_count(), 1);
    }

    #[test]
    fn add_column_with_cells_checks_kind_and_subtype() {
        let mut table = Table::new("t");
        let meta = ColumnMeta::new("Area", ElementKind::Numeric);
        let wrong_kind = vec![Cell::new(ElementKind::Integer, meta.subtype.clone())];
        assert!(matches!(
            table.add_column_with_cells(meta.clone(), wrong_kind),
            Err(TableError::KindMismatch { row: Some(0), .. })
        ));
        let wrong_subtype = vec![Cell::new(ElementKind::Numeric, Subtype::new("roi"))];
        assert!(matches!(
            table.add_column_with_cells(meta, wrong_subtype),
            Err(TableError::SubtypeMismatch { row: Some(0), .. })
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn add_row_with_cells_is_all_or_nothing() {
        let mut table = counts();
        table
            .add_column(ColumnMeta::new("Label", ElementKind::Text))
            .unwrap();
        let int_sub = ElementKind::Integer.default_subtype();
        let bad = vec![
            Cell::with_value(Underlying::Integer(1), int_sub.clone()),
            Cell::with_value(Underlying::Integer(2), int_sub.clone()),
        ];
        assert!(table.add_row_with_cells(bad).is_err());
        assert_eq!(table.row_count(), 0);
        assert!(table.column_cells(0).unwrap().is_empty());

        let good = vec![
            Cell::with_value(Underlying::Integer(1), int_sub),
            Cell::with_value("a".into(), ElementKind::Text.default_subtype()),
        ];
        assert_eq!(table.add_row_with_cells(good).unwrap(), 0);
        assert_eq!(table.cell_text(1, 0).unwrap(), "a");
    }

    #[test]
    fn removing_last_column_clears_rows() {
        let mut table = counts();
        table.add_row().unwrap();
        table.remove_column(0).unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn batch_removals_go_high_to_low() {
        let mut table = Table::new("t");
        for name in ["a", "b", "c", "d"] {
            table.add_column(ColumnMeta::new(name, ElementKind::Integer)).unwrap();
        }
        for _ in 0..5 {
            table.add_row().unwrap();
        }
        for row in 0..5 {
            table.set_cell_value(0, row, row as i64).unwrap();
        }
        table.remove_columns(&[1, 3]).unwrap();
        let names: Vec<_> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);

        table.remove_rows(&[0, 2, 4]).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell_text(0, 0).unwrap(), "1");
        assert_eq!(table.cell_text(0, 1).unwrap(), "3");

        assert!(matches!(
            table.remove_rows(&[0, 9]),
            Err(TableError::RowIndex { index: 9, len: 2 })
        ));
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn convert_integer_column_to_text() {
        let mut table = counts();
        for _ in 0..3 {
            table.add_row().unwrap();
        }
        let index = table.require_column("Count").unwrap();
        table
            .convert_column(index, ElementKind::Text, ElementKind::Text.default_subtype())
            .unwrap();
        assert_eq!(table.column(index).unwrap().kind, ElementKind::Text);
        for row in 0..3 {
            assert_eq!(
                table.cell(index, row).unwrap().value(),
                &Underlying::Text("0".into())
            );
        }
    }

    #[test]
    fn failed_conversion_changes_nothing() {
        let mut table = Table::new("t");
        table.add_column(ColumnMeta::new("Size", ElementKind::Text)).unwrap();
        for text in ["12", "37.5", "4"] {
            let row = table.add_row().unwrap();
            table.set_cell_text(0, row, text).unwrap();
        }
        let before = table.clone();
        let err = table
            .convert_column(0, ElementKind::Integer, ElementKind::Integer.default_subtype())
            .unwrap_err();
        match err {
            TableError::Conversion { column, row, .. } => {
                assert_eq!(column, "Size");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(table, before);

        table
            .convert_column(0, ElementKind::Numeric, ElementKind::Numeric.default_subtype())
            .unwrap();
        assert_eq!(table.cell(0, 1).unwrap().value(), &Underlying::Numeric(37.5));
    }

    #[test]
    fn subtype_change_reaches_every_cell() {
        let mut table = counts();
        table.add_row().unwrap();
        table.add_row().unwrap();
        table.set_column_subtype(0, Subtype::new("count/objects")).unwrap();
        assert!(table
            .column_cells(0)
            .unwrap()
            .iter()
            .all(|c| c.subtype() == "count/objects"));
    }

    #[test]
    fn update_cell_rejects_subtype_drift() {
        let mut table = counts();
        table.add_row().unwrap();
        let result: Result<(), TableError> = table.update_cell(0, 0, |cell| {
            cell.set_value(5i64)?;
            cell.set_subtype(Subtype::new("other"));
            Ok(())
        });
        assert!(matches!(result, Err(TableError::SubtypeMismatch { .. })));
        assert_eq!(table.cell_text(0, 0).unwrap(), "0");
    }

    #[test]
    fn out_of_bounds_access_is_reported() {
        let table = counts();
        assert!(matches!(
            table.cell(0, 0),
            Err(TableError::RowIndex { index: 0, len: 0 })
        ));
        assert!(matches!(
            table.column(3),
            Err(TableError::ColumnIndex { index: 3, len: 1 })
        ));
    }
}
