use std::any::Any;

use slideset_common::{ElementKind, Subtype, SubtypeSet};

use crate::processed::ProcessedType;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

/// One typed parameter of a routine.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    /// Human-facing label; falls back to `name`.
    pub label: Option<String>,
    pub direction: Direction,
    pub processed: ProcessedType,
    /// Restricts candidate columns to one kind.
    pub kind: Option<ElementKind>,
    /// Restricts candidate columns to these subtypes. Empty means any.
    pub subtypes: SubtypeSet,
    pub required: bool,
}

impl ParamSpec {
    pub fn input<T: Any>(name: impl Into<String>) -> Self {
        Self::new::<T>(name, Direction::In)
    }

    pub fn output<T: Any>(name: impl Into<String>) -> Self {
        Self::new::<T>(name, Direction::Out)
    }

    fn new<T: Any>(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            label: None,
            direction,
            processed: ProcessedType::of::<T>(),
            kind: None,
            subtypes: SubtypeSet::any(),
            required: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_subtypes(mut self, subtypes: SubtypeSet) -> Self {
        self.subtypes = subtypes;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::In
    }

    /// Whether the parameter's own kind/subtype filter admits a column.
    pub fn admits(&self, kind: ElementKind, subtype: &Subtype) -> bool {
        self.kind.is_none_or(|k| k == kind) && self.subtypes.accepts(subtype)
    }
}

/// Declared signature of a routine.
#[derive(Debug, Clone)]
pub struct RoutineSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl RoutineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn find(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| !p.is_input())
    }
}
