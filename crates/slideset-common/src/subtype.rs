use std::fmt::{self, Display};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ElementError;

static SUBTYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*(/([A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*|\*))?)$")
        .expect("subtype regex must compile")
});

/// Open, MIME-like tag refining what a cell's underlying data represents.
///
/// A subtype accepts another only when they are equal or when the accepting
/// side is the wildcard [`Subtype::ANY`]. There is no hierarchy: `image/tiff`
/// does not match `image`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subtype(String);

impl Subtype {
    pub const ANY: &'static str = "*";
    pub const LOGICAL: &'static str = "logical";
    pub const INTEGER: &'static str = "integer";
    pub const NUMERIC: &'static str = "numeric";
    pub const TEXT: &'static str = "text";
    pub const FILE: &'static str = "file";
    pub const TEXT_PLAIN: &'static str = "text/plain";
    pub const IMAGE: &'static str = "image";
    pub const ROI_SET: &'static str = "application/imagej-roiset";
    pub const TABLE_CSV: &'static str = "text/csv";

    /// Wrap a tag without validating it. Use [`Subtype::parse`] for input
    /// coming from users or documents.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn any() -> Self {
        Self(Self::ANY.to_string())
    }

    pub fn parse(tag: &str) -> Result<Self, ElementError> {
        let tag = tag.trim();
        if SUBTYPE_PATTERN.is_match(tag) {
            Ok(Self(tag.to_string()))
        } else {
            Err(ElementError::InvalidSubtype(tag.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        self.0 == Self::ANY
    }

    /// True when a value tagged `other` satisfies this subtype.
    pub fn accepts(&self, other: &Subtype) -> bool {
        self.is_any() || self == other
    }
}

impl Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Subtype {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for Subtype {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl PartialEq<str> for Subtype {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Subtype {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Set of subtypes an adapter or parameter accepts. Empty means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtypeSet(SmallVec<[Subtype; 2]>);

impl SubtypeSet {
    pub fn any() -> Self {
        Self(SmallVec::new())
    }

    pub fn of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Subtype>,
    {
        let mut set = Self::any();
        for tag in tags {
            set.insert(tag.into());
        }
        set
    }

    pub fn insert(&mut self, subtype: Subtype) {
        if !self.0.contains(&subtype) {
            self.0.push(subtype);
        }
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(Subtype::is_any)
    }

    pub fn accepts(&self, subtype: &Subtype) -> bool {
        self.is_any() || self.0.iter().any(|s| s.accepts(subtype))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subtype> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Subtype> for SubtypeSet {
    fn from(subtype: Subtype) -> Self {
        Self::of([subtype])
    }
}

impl Display for SubtypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return f.write_str(Subtype::ANY);
        }
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

impl From<&Subtype> for Subtype {
    fn from(subtype: &Subtype) -> Self {
        subtype.clone()
    }
}
