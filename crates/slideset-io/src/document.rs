//! Serializable form of a [`TableTree`].
//!
//! Cells are stored as text, one list per column, so a document written and
//! read back reproduces every cell's text exactly. Children are nested under
//! their parent in document order.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slideset_common::{Cell, ElementKind, Subtype};
use slideset_table::{ColumnMeta, CreationInfo, LinkDefaults, LinkPolicy, Table, TableId, TableTree};

use crate::error::IoError;

pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TreeDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tables: Vec<TableDocument>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<CreationDocument>,
    /// Omitted when the table uses [`LinkPolicy::default`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_policy: Option<LinkPolicyDocument>,
    #[serde(default)]
    pub columns: Vec<ColumnDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TableDocument>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreationDocument {
    pub command: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    pub created: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkPolicyDocument {
    pub counter_width: usize,
    pub separator: String,
    pub max_probe: u32,
}

impl From<&LinkPolicy> for LinkPolicyDocument {
    fn from(policy: &LinkPolicy) -> Self {
        Self {
            counter_width: policy.counter_width,
            separator: policy.separator.clone(),
            max_probe: policy.max_probe,
        }
    }
}

impl From<&LinkPolicyDocument> for LinkPolicy {
    fn from(doc: &LinkPolicyDocument) -> Self {
        Self {
            counter_width: doc.counter_width,
            separator: doc.separator.clone(),
            max_probe: doc.max_probe,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnDocument {
    pub name: String,
    pub kind: ElementKind,
    pub subtype: Subtype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkDocument>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default)]
    pub cells: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct LinkDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default)]
    pub counter: u32,
}

impl TreeDocument {
    /// Snapshot every root of `tree`, in insertion order.
    pub fn from_tree(tree: &TableTree) -> Result<Self, IoError> {
        let tables = tree
            .roots()
            .iter()
            .map(|root| TableDocument::from_subtree(tree, *root))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            version: DOCUMENT_VERSION,
            tables,
        })
    }

    pub fn into_tree(self) -> Result<TableTree, IoError> {
        if self.version > DOCUMENT_VERSION {
            return Err(IoError::Version {
                found: self.version,
                supported: DOCUMENT_VERSION,
            });
        }
        let mut tree = TableTree::new();
        for doc in &self.tables {
            let root = tree.insert_root(doc.to_table()?);
            doc.insert_children(&mut tree, root)?;
        }
        Ok(tree)
    }
}

impl TableDocument {
    pub fn from_table(table: &Table) -> Self {
        let columns = table
            .columns()
            .iter()
            .enumerate()
            .map(|(index, meta)| ColumnDocument {
                name: meta.name.clone(),
                kind: meta.kind,
                subtype: meta.subtype.clone(),
                link: (meta.link != LinkDefaults::default()).then(|| LinkDocument {
                    base_dir: meta.link.base_dir.clone(),
                    prefix: meta.link.prefix.clone(),
                    extension: meta.link.extension.clone(),
                    counter: meta.link.counter,
                }),
                extra: meta.extra.clone(),
                cells: table
                    .column_cells(index)
                    .map(|cells| cells.iter().map(Cell::text).collect())
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            name: table.name().to_string(),
            working_dir: table.working_dir().map(|p| p.to_path_buf()),
            creation: table.creation().map(|c| CreationDocument {
                command: c.command.clone(),
                parameters: c.parameters.clone(),
                created: c.created,
            }),
            link_policy: (*table.link_policy() != LinkPolicy::default())
                .then(|| LinkPolicyDocument::from(table.link_policy())),
            columns,
            children: Vec::new(),
        }
    }

    fn from_subtree(tree: &TableTree, id: TableId) -> Result<Self, IoError> {
        let table = tree.get(id).map_err(|e| IoError::table(&id.to_string(), e))?;
        let mut doc = Self::from_table(table);
        let children = tree
            .children(id)
            .map_err(|e| IoError::table(table.name(), e))?;
        for child in children {
            doc.children.push(Self::from_subtree(tree, *child)?);
        }
        Ok(doc)
    }

    /// Rebuild the table described here, without its children.
    pub fn to_table(&self) -> Result<Table, IoError> {
        let mut table = Table::new(self.name.clone());
        table.set_working_dir(self.working_dir.clone());
        table.set_creation(self.creation.as_ref().map(|c| CreationInfo {
            command: c.command.clone(),
            parameters: c.parameters.clone(),
            created: c.created,
        }));
        if let Some(policy) = &self.link_policy {
            table.set_link_policy(policy.into());
        }

        for column in &self.columns {
            let mut meta = ColumnMeta::new(column.name.clone(), column.kind)
                .with_subtype(column.subtype.clone());
            if let Some(link) = &column.link {
                meta.link = LinkDefaults {
                    base_dir: link.base_dir.clone(),
                    prefix: link.prefix.clone(),
                    extension: link.extension.clone(),
                    counter: link.counter,
                };
            }
            meta.extra = column.extra.clone();

            let cells = column
                .cells
                .iter()
                .enumerate()
                .map(|(row, text)| {
                    Cell::from_text(column.kind, column.subtype.clone(), text).map_err(|source| {
                        IoError::Cell {
                            table: self.name.clone(),
                            column: column.name.clone(),
                            row,
                            source,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            table
                .add_column_with_cells(meta, cells)
                .map_err(|e| IoError::table(&self.name, e))?;
        }
        Ok(table)
    }

    fn insert_children(&self, tree: &mut TableTree, parent: TableId) -> Result<(), IoError> {
        for child in &self.children {
            let id = tree
                .insert_child(parent, child.to_table()?)
                .map_err(|e| IoError::table(&self.name, e))?;
            child.insert_children(tree, id)?;
        }
        Ok(())
    }
}
