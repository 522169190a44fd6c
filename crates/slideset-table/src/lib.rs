//! Typed tables for SlideSet.
//!
//! A [`Table`] is an ordered set of named columns, each holding cells of a
//! single [`ElementKind`](slideset_common::ElementKind) and subtype. Tables
//! are arranged in a [`TableTree`]: running a routine against a table
//! produces a child table that the parent owns.

mod column;
mod error;
mod link;
mod table;
mod tree;

pub use column::{ColumnMeta, LinkDefaults};
pub use error::{LinkError, TableError};
pub use link::LinkPolicy;
pub use table::{CreationInfo, Table};
pub use tree::{TableId, TableTree};

pub use slideset_common::{Cell, ElementKind, PathContext, Subtype, Underlying};
