use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use slideset_common::{ElementKind, Subtype};

use crate::adapter::{ElementReader, ElementWriter};
use crate::processed::ProcessedType;

/// Explicitly registered readers and writers, keyed by adapter name.
///
/// Registration order is kept so candidate lists come out in a stable order.
/// Registering a second adapter under an existing name replaces the first in
/// place.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    readers: Vec<Arc<dyn ElementReader>>,
    writers: Vec<Arc<dyn ElementWriter>>,
    reader_index: FxHashMap<String, usize>,
    writer_index: FxHashMap<String, usize>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the primitive adapters from [`crate::builtins`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    pub fn register_reader(&mut self, reader: impl ElementReader + 'static) {
        self.register_reader_arc(Arc::new(reader));
    }

    pub fn register_reader_arc(&mut self, reader: Arc<dyn ElementReader>) {
        let name = reader.info().name.clone();
        #[cfg(feature = "tracing")]
        tracing::trace!(reader = %name, kind = %reader.info().kind, "registering reader");
        match self.reader_index.get(&name) {
            Some(&slot) => self.readers[slot] = reader,
            None => {
                self.reader_index.insert(name, self.readers.len());
                self.readers.push(reader);
            }
        }
    }

    pub fn register_writer(&mut self, writer: impl ElementWriter + 'static) {
        self.register_writer_arc(Arc::new(writer));
    }

    pub fn register_writer_arc(&mut self, writer: Arc<dyn ElementWriter>) {
        let name = writer.info().name.clone();
        #[cfg(feature = "tracing")]
        tracing::trace!(writer = %name, kind = %writer.info().kind, "registering writer");
        match self.writer_index.get(&name) {
            Some(&slot) => self.writers[slot] = writer,
            None => {
                self.writer_index.insert(name, self.writers.len());
                self.writers.push(writer);
            }
        }
    }

    pub fn reader(&self, name: &str) -> Option<&Arc<dyn ElementReader>> {
        self.reader_index.get(name).map(|&i| &self.readers[i])
    }

    pub fn writer(&self, name: &str) -> Option<&Arc<dyn ElementWriter>> {
        self.writer_index.get(name).map(|&i| &self.writers[i])
    }

    pub fn readers(&self) -> &[Arc<dyn ElementReader>] {
        &self.readers
    }

    pub fn writers(&self) -> &[Arc<dyn ElementWriter>] {
        &self.writers
    }

    /// Readers able to read cells of exactly `kind` with `subtype`.
    pub fn readers_for<'a>(
        &'a self,
        kind: ElementKind,
        subtype: &'a Subtype,
    ) -> impl Iterator<Item = &'a Arc<dyn ElementReader>> + 'a {
        self.readers
            .iter()
            .filter(move |r| r.info().accepts(kind, subtype))
    }

    pub fn readers_producing(
        &self,
        processed: ProcessedType,
    ) -> impl Iterator<Item = &Arc<dyn ElementReader>> {
        self.readers
            .iter()
            .filter(move |r| r.info().processed == processed)
    }

    pub fn writers_consuming(
        &self,
        processed: ProcessedType,
    ) -> impl Iterator<Item = &Arc<dyn ElementWriter>> {
        self.writers
            .iter()
            .filter(move |w| w.info().processed == processed)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field(
                "readers",
                &self.readers.iter().map(|r| &r.info().name).collect::<Vec<_>>(),
            )
            .field(
                "writers",
                &self.writers.iter().map(|w| &w.info().name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/* ───────────────────────── Process-wide registry ───────────────────────── */

static GLOBAL: Lazy<RwLock<AdapterRegistry>> =
    Lazy::new(|| RwLock::new(AdapterRegistry::with_builtins()));

/// Add a reader to the process-wide registry.
pub fn register_reader(reader: impl ElementReader + 'static) {
    GLOBAL.write().register_reader(reader);
}

/// Add a writer to the process-wide registry.
pub fn register_writer(writer: impl ElementWriter + 'static) {
    GLOBAL.write().register_writer(writer);
}

/// Copy of the process-wide registry. Adapters are shared, not cloned.
pub fn global_snapshot() -> AdapterRegistry {
    GLOBAL.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::FnReader;

    #[test]
    fn same_name_replaces_in_place() {
        let mut reg = AdapterRegistry::new();
        reg.register_reader(FnReader::new("a", ElementKind::Text, |c, _| Ok(c.text())));
        reg.register_reader(FnReader::new("b", ElementKind::Text, |c, _| Ok(c.text())));
        reg.register_reader(FnReader::new("a", ElementKind::Integer, |c, _| Ok(c.text())));

        let names: Vec<_> = reg.readers().iter().map(|r| r.info().name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(reg.reader("a").unwrap().info().kind, ElementKind::Integer);
    }

    #[test]
    fn global_registration_is_visible_in_snapshots() {
        register_reader(FnReader::new("test-global-upper", ElementKind::Text, |c, _| {
            Ok(c.text().to_uppercase())
        }));
        let snapshot = global_snapshot();
        assert!(snapshot.reader("test-global-upper").is_some());
        assert!(snapshot.reader("integer-i32").is_some());
    }
}
