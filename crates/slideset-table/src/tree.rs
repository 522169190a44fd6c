use std::fmt;
use std::path::PathBuf;

use crate::error::TableError;
use crate::table::Table;

/// Stable handle to a table inside a [`TableTree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u32);

impl TableId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Node {
    table: Table,
    parent: Option<TableId>,
    children: Vec<TableId>,
}

/// Arena holding a forest of tables.
///
/// A parent owns the list of its children; a child only records its parent's
/// id. Removing a table that still has children is refused: children must be
/// detached (or removed) first.
#[derive(Debug, Default)]
pub struct TableTree {
    nodes: Vec<Option<Node>>,
    roots: Vec<TableId>,
}

impl TableTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn insert_root(&mut self, table: Table) -> TableId {
        let id = self.allocate(table, None);
        self.roots.push(id);
        id
    }

    pub fn insert_child(&mut self, parent: TableId, table: Table) -> Result<TableId, TableError> {
        self.node(parent)?;
        let id = self.allocate(table, Some(parent));
        self.node_mut(parent)?.children.push(id);
        #[cfg(feature = "tracing")]
        tracing::debug!(%parent, child = %id, "registered child table");
        Ok(id)
    }

    pub fn get(&self, id: TableId) -> Result<&Table, TableError> {
        self.node(id).map(|n| &n.table)
    }

    pub fn get_mut(&mut self, id: TableId) -> Result<&mut Table, TableError> {
        self.node_mut(id).map(|n| &mut n.table)
    }

    pub fn parent(&self, id: TableId) -> Result<Option<TableId>, TableError> {
        self.node(id).map(|n| n.parent)
    }

    pub fn children(&self, id: TableId) -> Result<&[TableId], TableError> {
        self.node(id).map(|n| n.children.as_slice())
    }

    pub fn roots(&self) -> &[TableId] {
        &self.roots
    }

    /// Turn a child into a root. Detaching a root is a no-op.
    pub fn detach(&mut self, id: TableId) -> Result<(), TableError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        self.roots.push(id);
        Ok(())
    }

    /// Remove a table with no children and return it.
    pub fn remove(&mut self, id: TableId) -> Result<Table, TableError> {
        let node = self.node(id)?;
        if !node.children.is_empty() {
            return Err(TableError::HasChildren {
                name: node.table.name().to_string(),
                children: node.children.len(),
            });
        }
        let parent = node.parent;
        match parent {
            Some(parent) => self.node_mut(parent)?.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
        let node = self.nodes[id.index()]
            .take()
            .ok_or(TableError::UnknownTable { id })?;
        Ok(node.table)
    }

    /// Set the working directory of `id` and of every table below it.
    pub fn set_working_dir_recursive(
        &mut self,
        id: TableId,
        dir: Option<PathBuf>,
    ) -> Result<(), TableError> {
        for member in self.walk(id)? {
            self.get_mut(member)?.set_working_dir(dir.clone());
        }
        Ok(())
    }

    /// Pre-order (document order) traversal of the subtree rooted at `id`.
    pub fn walk(&self, id: TableId) -> Result<Vec<TableId>, TableError> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            let node = self.node(next)?;
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Pre-order traversal of every root in insertion order.
    pub fn walk_all(&self) -> Vec<TableId> {
        self.roots
            .iter()
            .flat_map(|r| self.walk(*r).unwrap_or_default())
            .collect()
    }

    /// Depth of `id` below its root (roots are at depth 0).
    pub fn depth(&self, id: TableId) -> Result<usize, TableError> {
        let mut depth = 0;
        let mut cursor = self.node(id)?.parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.node(parent)?.parent;
        }
        Ok(depth)
    }

    /// Find a table by a `/`-separated path of names starting at a root,
    /// e.g. `"experiment/Measure results"`.
    pub fn find_path(&self, path: &str) -> Option<TableId> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = *self
            .roots
            .iter()
            .find(|r| self.get(**r).map(|t| t.name() == first).unwrap_or(false))?;
        for segment in segments {
            let children = self.children(current).ok()?;
            current = *children
                .iter()
                .find(|c| self.get(**c).map(|t| t.name() == segment).unwrap_or(false))?;
        }
        Some(current)
    }

    /// The `/`-separated name path of `id` from its root.
    pub fn path_of(&self, id: TableId) -> Result<String, TableError> {
        let mut names = vec![self.get(id)?.name().to_string()];
        let mut cursor = self.parent(id)?;
        while let Some(parent) = cursor {
            names.push(self.get(parent)?.name().to_string());
            cursor = self.parent(parent)?;
        }
        names.reverse();
        Ok(names.join("/"))
    }

    fn allocate(&mut self, table: Table, parent: Option<TableId>) -> TableId {
        let id = TableId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            table,
            parent,
            children: Vec::new(),
        }));
        id
    }

    fn node(&self, id: TableId) -> Result<&Node, TableError> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(TableError::UnknownTable { id })
    }

    fn node_mut(&mut self, id: TableId) -> Result<&mut Node, TableError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TableError::UnknownTable { id })
    }
}
