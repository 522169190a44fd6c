use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
    path::Path,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ElementError, ElementKind, Subtype};

/* ───────────────────────── Logical literals ──────────────────────────
Text accepted for logical cells is deliberately narrow:
  true  ← t T true True TRUE 1
  false ← f F false False FALSE 0
Anything else is rejected rather than guessed at.
------------------------------------------------------------------- */

pub fn parse_logical(text: &str) -> Option<bool> {
    match text {
        "t" | "T" | "true" | "True" | "TRUE" | "1" => Some(true),
        "f" | "F" | "false" | "False" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

/// The durable datum stored in one table slot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "kebab-case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Underlying {
    Logical(bool),
    Integer(i64),
    Numeric(f64),
    Text(String),
    /// Relative or absolute path; empty when no file is linked yet.
    FileLink(String),
}

impl Hash for Underlying {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Underlying::Logical(b) => b.hash(state),
            Underlying::Integer(i) => i.hash(state),
            Underlying::Numeric(n) => n.to_bits().hash(state),
            Underlying::Text(s) | Underlying::FileLink(s) => s.hash(state),
        }
    }
}

impl Display for Underlying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Underlying::Logical(b) => write!(f, "{b}"),
            Underlying::Integer(i) => write!(f, "{i}"),
            Underlying::Numeric(n) => write!(f, "{n}"),
            Underlying::Text(s) | Underlying::FileLink(s) => f.write_str(s),
        }
    }
}

impl Underlying {
    pub fn kind(&self) -> ElementKind {
        match self {
            Underlying::Logical(_) => ElementKind::Logical,
            Underlying::Integer(_) => ElementKind::Integer,
            Underlying::Numeric(_) => ElementKind::Numeric,
            Underlying::Text(_) => ElementKind::Text,
            Underlying::FileLink(_) => ElementKind::FileLink,
        }
    }

    /// Text form used for persistence and for column conversion.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Parse `text` as a value of `kind`.
    pub fn parse(kind: ElementKind, text: &str) -> Result<Self, ElementError> {
        match kind {
            ElementKind::Logical => parse_logical(text)
                .map(Underlying::Logical)
                .ok_or_else(|| ElementError::parse(kind, text)),
            ElementKind::Integer => text
                .parse::<i64>()
                .map(Underlying::Integer)
                .map_err(|_| ElementError::parse(kind, text)),
            ElementKind::Numeric => text
                .parse::<f64>()
                .map(Underlying::Numeric)
                .map_err(|_| ElementError::parse(kind, text)),
            ElementKind::Text => Ok(Underlying::Text(text.to_string())),
            ElementKind::FileLink => Ok(Underlying::FileLink(text.to_string())),
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Underlying::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Underlying::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Underlying::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Underlying::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Linked path, or `None` for non-link values and empty links.
    pub fn as_link(&self) -> Option<&Path> {
        match self {
            Underlying::FileLink(s) if !s.is_empty() => Some(Path::new(s)),
            _ => None,
        }
    }
}

impl From<bool> for Underlying {
    fn from(value: bool) -> Self {
        Underlying::Logical(value)
    }
}

impl From<i64> for Underlying {
    fn from(value: i64) -> Self {
        Underlying::Integer(value)
    }
}

impl From<i32> for Underlying {
    fn from(value: i32) -> Self {
        Underlying::Integer(value as i64)
    }
}

impl From<f64> for Underlying {
    fn from(value: f64) -> Self {
        Underlying::Numeric(value)
    }
}

impl From<String> for Underlying {
    fn from(value: String) -> Self {
        Underlying::Text(value)
    }
}

impl From<&str> for Underlying {
    fn from(value: &str) -> Self {
        Underlying::Text(value.to_string())
    }
}

/// A single typed value holder: underlying datum plus subtype tag.
///
/// The kind is fixed by the value variant and cannot change; assignments
/// of a different kind are rejected. Cells owned by a table should have
/// their subtype changed only through the table, which updates the whole
/// column at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    value: Underlying,
    subtype: Subtype,
}

impl Cell {
    /// Default-valued cell of `kind`.
    pub fn new(kind: ElementKind, subtype: Subtype) -> Self {
        Self {
            value: kind.default_value(),
            subtype,
        }
    }

    pub fn with_value(value: Underlying, subtype: Subtype) -> Self {
        Self { value, subtype }
    }

    /// Deserialize a cell of `kind` from its text form.
    pub fn from_text(kind: ElementKind, subtype: Subtype, text: &str) -> Result<Self, ElementError> {
        Ok(Self {
            value: Underlying::parse(kind, text)?,
            subtype,
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.value.kind()
    }

    pub fn subtype(&self) -> &Subtype {
        &self.subtype
    }

    pub fn set_subtype(&mut self, subtype: Subtype) {
        self.subtype = subtype;
    }

    pub fn value(&self) -> &Underlying {
        &self.value
    }

    pub fn into_value(self) -> Underlying {
        self.value
    }

    /// Replace the underlying value. Fails, leaving the cell untouched, when
    /// `value` is of a different kind.
    pub fn set_value(&mut self, value: impl Into<Underlying>) -> Result<(), ElementError> {
        let value = value.into();
        if value.kind() != self.kind() {
            return Err(ElementError::KindMismatch {
                expected: self.kind(),
                found: value.kind(),
            });
        }
        self.value = value;
        Ok(())
    }

    pub fn text(&self) -> String {
        self.value.to_text()
    }

    /// Parse `text` under this cell's kind. On failure the cell is unchanged.
    pub fn set_text(&mut self, text: &str) -> Result<(), ElementError> {
        self.value = Underlying::parse(self.kind(), text)?;
        Ok(())
    }

    pub fn is_compatible(&self, kind: ElementKind, subtype: &Subtype) -> bool {
        self.kind() == kind && &self.subtype == subtype
    }

    pub fn link(&self) -> Option<&Path> {
        self.value.as_link()
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn logical_literal_sets() {
        for text in ["t", "T", "true", "True", "TRUE", "1"] {
            assert_eq!(
                Underlying::parse(ElementKind::Logical, text).unwrap(),
                Underlying::Logical(true),
                "{text}"
            );
        }
        for text in ["f", "F", "false", "False", "FALSE", "0"] {
            assert_eq!(
                Underlying::parse(ElementKind::Logical, text).unwrap(),
                Underlying::Logical(false),
                "{text}"
            );
        }
        for text in ["yes", "tRUE", "", " true", "2", "no"] {
            assert!(Underlying::parse(ElementKind::Logical, text).is_err(), "{text}");
        }
    }

    #[test]
    fn integer_rejects_fractional_text() {
        let err = Underlying::parse(ElementKind::Integer, "37.5").unwrap_err();
        assert_eq!(
            err,
            ElementError::Parse {
                kind: ElementKind::Integer,
                text: "37.5".into()
            }
        );
    }

    #[test]
    fn set_value_keeps_kind() {
        let mut cell = Cell::new(ElementKind::Integer, ElementKind::Integer.default_subtype());
        cell.set_value(7i64).unwrap();
        assert_eq!(cell.text(), "7");
        assert!(cell.set_value("seven").is_err());
        assert_eq!(cell.value(), &Underlying::Integer(7));
    }

    #[test]
    fn failed_set_text_leaves_cell_alone() {
        let mut cell = Cell::with_value(Underlying::Numeric(2.5), Subtype::new("numeric"));
        assert!(cell.set_text("abc").is_err());
        assert_eq!(cell.value(), &Underlying::Numeric(2.5));
    }

    #[test]
    fn empty_link_is_none() {
        let cell = Cell::new(ElementKind::FileLink, Subtype::new(Subtype::FILE));
        assert!(cell.link().is_none());
        let cell = Cell::with_value(Underlying::FileLink("a/b.txt".into()), Subtype::any());
        assert_eq!(cell.link(), Some(Path::new("a/b.txt")));
    }

    proptest! {
        #[test]
        fn logical_text_round_trips(b in any::<bool>()) {
            let v = Underlying::Logical(b);
            prop_assert_eq!(Underlying::parse(ElementKind::Logical, &v.to_text()).unwrap(), v);
        }

        #[test]
        fn integer_text_round_trips(i in any::<i64>()) {
            let v = Underlying::Integer(i);
            prop_assert_eq!(Underlying::parse(ElementKind::Integer, &v.to_text()).unwrap(), v);
        }

        #[test]
        fn numeric_text_round_trips(n in prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::SUBNORMAL | prop::num::f64::INFINITE) {
            let v = Underlying::Numeric(n);
            prop_assert_eq!(Underlying::parse(ElementKind::Numeric, &v.to_text()).unwrap(), v);
        }

        #[test]
        fn text_round_trips(s in ".*") {
            let v = Underlying::Text(s);
            prop_assert_eq!(Underlying::parse(ElementKind::Text, &v.to_text()).unwrap(), v);
        }
    }
}
