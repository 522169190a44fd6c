use std::path::{Path, PathBuf};

use slideset_common::{Cell, ElementKind, Underlying};

use crate::error::{LinkError, TableError};
use crate::table::Table;

/// How default link names are formatted and how far probing may go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Zero-padded width of the counter (`3` gives `007`).
    pub counter_width: usize,
    /// Placed between prefix and counter.
    pub separator: String,
    /// Upper bound on existing files skipped in one call.
    pub max_probe: u32,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            counter_width: 3,
            separator: "-".to_string(),
            max_probe: 100_000,
        }
    }
}

impl LinkPolicy {
    /// `base/prefix<sep>NNN[.ext]`
    pub fn compose(
        &self,
        base_dir: &Path,
        prefix: &str,
        counter: u32,
        extension: Option<&str>,
    ) -> PathBuf {
        let width = self.counter_width;
        let mut file_name = format!("{prefix}{}{counter:0width$}", self.separator);
        if let Some(ext) = extension.map(|e| e.trim_start_matches('.')).filter(|e| !e.is_empty()) {
            file_name.push('.');
            file_name.push_str(ext);
        }
        base_dir.join(file_name)
    }
}

impl Table {
    /// Absolute paths are returned unchanged; relative paths are joined to
    /// the table's working directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.path_context().resolve(path)
    }

    /// Generate an unused link for a file-link cell, store it in the cell, and
    /// advance the column counter past it.
    ///
    /// Candidates are probed on disk through [`Table::resolve_path`]; existing
    /// files are skipped. The counter is never rewound.
    pub fn make_default_link(&mut self, column: usize, row: usize) -> Result<PathBuf, TableError> {
        let (link, next_counter) = self.next_default_link(column, row)?;
        let subtype = self.columns()[column].subtype.clone();
        let text = link.to_string_lossy().into_owned();
        self.replace_cell(column, row, Cell::with_value(Underlying::FileLink(text), subtype));
        self.column_link_mut(column).counter = next_counter;
        Ok(link)
    }

    /// Like [`Table::update_cell`], but an empty file-link cell is first given
    /// a default link. The link and the counter advance are committed only
    /// when `f` succeeds.
    pub fn update_linked_cell<E, F>(&mut self, column: usize, row: usize, f: F) -> Result<(), E>
    where
        E: From<TableError>,
        F: FnOnce(&mut Cell) -> Result<(), E>,
    {
        self.check_cell(column, row)?;
        if self.columns()[column].kind != ElementKind::FileLink || self.cell(column, row)?.link().is_some() {
            return self.update_cell(column, row, f);
        }
        let (link, next_counter) = self.next_default_link(column, row)?;
        let subtype = self.columns()[column].subtype.clone();
        let text = link.to_string_lossy().into_owned();
        let mut cell = Cell::with_value(Underlying::FileLink(text), subtype);
        f(&mut cell)?;
        Self::check_cell_against(&self.columns()[column], &cell, Some(row))?;
        self.replace_cell(column, row, cell);
        self.column_link_mut(column).counter = next_counter;
        Ok(())
    }

    /// Probe for the next unused default link without touching the table.
    /// Returns the link and the counter value that follows it.
    fn next_default_link(&self, column: usize, row: usize) -> Result<(PathBuf, u32), TableError> {
        self.check_cell(column, row)?;
        let meta = &self.columns()[column];
        if meta.kind != ElementKind::FileLink {
            return Err(LinkError::NotAFileLink {
                column: meta.name.clone(),
                kind: meta.kind,
            }
            .into());
        }
        let Some(base_dir) = meta.link.base_dir.as_deref() else {
            return Err(LinkError::NoDefaultPath {
                column: meta.name.clone(),
            }
            .into());
        };
        let prefix = meta.link_prefix();
        let extension = meta.link.extension.as_deref();
        let policy = self.link_policy();

        let mut counter = meta.link.counter;
        let mut attempts = 0u32;
        let link = loop {
            let candidate = policy.compose(base_dir, prefix, counter, extension);
            if !self.resolve_path(&candidate).exists() {
                break candidate;
            }
            attempts += 1;
            if attempts >= policy.max_probe {
                return Err(LinkError::ProbeExhausted {
                    column: meta.name.clone(),
                    attempts,
                }
                .into());
            }
            counter = counter.checked_add(1).ok_or_else(|| LinkError::ProbeExhausted {
                column: meta.name.clone(),
                attempts,
            })?;
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(column = %meta.name, row, link = %link.display(), skipped = attempts, "generated default link");

        Ok((link, counter.saturating_add(1)))
    }

    /// Whether the file linked from a cell exists. Empty links and non-link
    /// cells report `false`.
    pub fn linked_file_exists(&self, column: usize, row: usize) -> Result<bool, TableError> {
        let cell = self.cell(column, row)?;
        Ok(cell
            .link()
            .map(|p| self.resolve_path(p).exists())
            .unwrap_or(false))
    }

    /// Resolved path of a linked file, failing when the cell has no link or
    /// the file is missing.
    pub fn linked_file(&self, column: usize, row: usize) -> Result<PathBuf, TableError> {
        let cell = self.cell(column, row)?;
        let meta = &self.columns()[column];
        if meta.kind != ElementKind::FileLink {
            return Err(LinkError::NotAFileLink {
                column: meta.name.clone(),
                kind: meta.kind,
            }
            .into());
        }
        let path = cell.link().map(|p| self.resolve_path(p)).unwrap_or_default();
        if path.as_os_str().is_empty() || !path.exists() {
            return Err(LinkError::MissingFile { path }.into());
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_pads_counter_and_adds_extension() {
        let policy = LinkPolicy::default();
        assert_eq!(
            policy.compose(Path::new("out"), "item", 7, Some("txt")),
            PathBuf::from("out/item-007.txt")
        );
        assert_eq!(
            policy.compose(Path::new("out"), "item", 1234, None),
            PathBuf::from("out/item-1234")
        );
        assert_eq!(
            policy.compose(Path::new("out"), "item", 0, Some(".tif")),
            PathBuf::from("out/item-000.tif")
        );
    }
}
