use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use slideset_table::TableTree;

use crate::SaveDestination;
use crate::document::TreeDocument;
use crate::error::IoError;

#[derive(Clone, Debug)]
pub struct JsonWriteOptions {
    /// Indented output. Compact when false.
    pub pretty: bool,
}

impl Default for JsonWriteOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// JSON persistence for a whole [`TableTree`].
#[derive(Debug, Default, Clone)]
pub struct JsonAdapter {
    doc: TreeDocument,
    path: Option<PathBuf>,
}

impl JsonAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tree(tree: &TableTree) -> Result<Self, IoError> {
        Ok(Self {
            doc: TreeDocument::from_tree(tree)?,
            path: None,
        })
    }

    pub fn document(&self) -> &TreeDocument {
        &self.doc
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn into_tree(self) -> Result<TableTree, IoError> {
        self.doc.into_tree()
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let file = File::open(path.as_ref())?;
        let doc: TreeDocument = serde_json::from_reader(BufReader::new(file))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.as_ref().display(), tables = doc.tables.len(), "opened table document");
        Ok(Self {
            doc,
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn open_reader<R: Read>(reader: R) -> Result<Self, IoError> {
        Ok(Self {
            doc: serde_json::from_reader(reader)?,
            path: None,
        })
    }

    pub fn open_bytes(bytes: &[u8]) -> Result<Self, IoError> {
        Ok(Self {
            doc: serde_json::from_slice(bytes)?,
            path: None,
        })
    }

    pub fn to_json_string(&self) -> Result<String, IoError> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }

    /// Write the document. Returns the bytes for [`SaveDestination::Bytes`].
    pub fn save_to(
        &self,
        dest: SaveDestination<'_>,
        opts: &JsonWriteOptions,
    ) -> Result<Option<Vec<u8>>, IoError> {
        match dest {
            SaveDestination::InPlace => {
                let Some(path) = self.path.as_ref() else {
                    return Err(IoError::Backend {
                        backend: "json".to_string(),
                        message: "no known path for in-place save".to_string(),
                    });
                };
                self.write_file(path, opts)?;
                Ok(None)
            }
            SaveDestination::Path(path) => {
                self.write_file(path, opts)?;
                Ok(None)
            }
            SaveDestination::Writer(writer) => {
                self.write_json(writer, opts)?;
                Ok(None)
            }
            SaveDestination::Bytes => {
                let mut buf = Vec::new();
                self.write_json(&mut buf, opts)?;
                Ok(Some(buf))
            }
        }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        self.save_to(SaveDestination::Path(path.as_ref()), &JsonWriteOptions::default())
            .map(|_| ())
    }

    pub fn save_to_bytes(&self) -> Result<Vec<u8>, IoError> {
        Ok(self
            .save_to(SaveDestination::Bytes, &JsonWriteOptions::default())?
            .unwrap_or_default())
    }

    fn write_file(&self, path: &Path, opts: &JsonWriteOptions) -> Result<(), IoError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_json(&mut writer, opts)?;
        writer.flush()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "saved table document");
        Ok(())
    }

    fn write_json<W: Write + ?Sized>(&self, writer: &mut W, opts: &JsonWriteOptions) -> Result<(), IoError> {
        if opts.pretty {
            serde_json::to_writer_pretty(&mut *writer, &self.doc)?;
        } else {
            serde_json::to_writer(&mut *writer, &self.doc)?;
        }
        Ok(())
    }
}

/// Serialize `tree` to a pretty JSON string.
pub fn to_json_string(tree: &TableTree) -> Result<String, IoError> {
    JsonAdapter::from_tree(tree)?.to_json_string()
}

/// Parse a tree from JSON text.
pub fn from_json_str(text: &str) -> Result<TableTree, IoError> {
    JsonAdapter::open_bytes(text.as_bytes())?.into_tree()
}

pub fn save_tree<P: AsRef<Path>>(tree: &TableTree, path: P) -> Result<(), IoError> {
    JsonAdapter::from_tree(tree)?.save_to_path(path)
}

pub fn load_tree<P: AsRef<Path>>(path: P) -> Result<TableTree, IoError> {
    JsonAdapter::open_path(path)?.into_tree()
}
