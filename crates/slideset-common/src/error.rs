//! Errors raised while building, parsing, or re-typing a single cell.
//!
//! - **`ElementError::Parse`**       : text does not deserialize under a kind
//! - **`ElementError::KindMismatch`**: a value of the wrong kind was assigned
//! - **`ElementError::UnknownKind`** : a kind name could not be recognised
//!
//! Table-level failures wrap these with column/row context; see
//! `slideset_table::TableError`.

use thiserror::Error;

use crate::ElementKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("cannot parse `{text}` as a {kind} value")]
    Parse { kind: ElementKind, text: String },

    #[error("expected a {expected} value, found {found}")]
    KindMismatch {
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("unknown element kind `{0}`")]
    UnknownKind(String),

    #[error("invalid subtype `{0}`")]
    InvalidSubtype(String),
}

impl ElementError {
    pub fn parse(kind: ElementKind, text: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            text: text.into(),
        }
    }
}
