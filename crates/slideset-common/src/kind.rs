use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ElementError, Subtype, Underlying};

/// The fixed storage shape of a cell.
///
/// Every cell in a column shares one kind, and a cell never changes kind after
/// construction. Re-typing a column goes through
/// `Table::convert_column`, which rebuilds the cells from their text form.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Logical,
    Integer,
    Numeric,
    Text,
    FileLink,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Logical,
        ElementKind::Integer,
        ElementKind::Numeric,
        ElementKind::Text,
        ElementKind::FileLink,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Logical => "logical",
            Self::Integer => "integer",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::FileLink => "file-link",
        }
    }

    /// Parse a kind name. Accepts the canonical names plus a few common
    /// aliases (`bool`, `int`, `float`, `double`, `string`, `file`).
    pub fn parse(s: &str) -> Result<Self, ElementError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logical" | "boolean" | "bool" => Ok(Self::Logical),
            "integer" | "int" => Ok(Self::Integer),
            "numeric" | "number" | "float" | "double" => Ok(Self::Numeric),
            "text" | "string" => Ok(Self::Text),
            "file-link" | "filelink" | "file" | "link" => Ok(Self::FileLink),
            _ => Err(ElementError::UnknownKind(s.to_string())),
        }
    }

    /// Subtype assigned to new columns of this kind when none is given.
    pub fn default_subtype(self) -> Subtype {
        Subtype::new(match self {
            Self::Logical => Subtype::LOGICAL,
            Self::Integer => Subtype::INTEGER,
            Self::Numeric => Subtype::NUMERIC,
            Self::Text => Subtype::TEXT,
            Self::FileLink => Subtype::FILE,
        })
    }

    pub fn default_value(self) -> Underlying {
        match self {
            Self::Logical => Underlying::Logical(false),
            Self::Integer => Underlying::Integer(0),
            Self::Numeric => Underlying::Numeric(0.0),
            Self::Text => Underlying::Text(String::new()),
            Self::FileLink => Underlying::FileLink(String::new()),
        }
    }

    pub const fn is_file_link(self) -> bool {
        matches!(self, Self::FileLink)
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
