use slideset_common::{ElementError, ElementKind};
use slideset_table::{LinkError, TableError};
use thiserror::Error;

/// Error type for the binding layer.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("parameter `{param}` has no compatible column or constant in table `{table}`")]
    NoCandidates { param: String, table: String },

    #[error("no selection was made for required parameter `{param}`")]
    MissingSelection { param: String },

    /// The chooser was dismissed. Nothing has been committed.
    #[error("parameter selection was cancelled")]
    Cancelled,

    #[error("invalid selection for parameter `{param}`: {reason}")]
    InvalidSelection { param: String, reason: String },

    #[error("adapter `{adapter}` handles {expected} cells, got {found}")]
    CellKind {
        adapter: String,
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("processed value has type `{found}`, expected `{expected}`")]
    ProcessedTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} does not fit in `{target}`")]
    OutOfRange { value: String, target: &'static str },

    #[error("adapter `{adapter}` needs a file link but the cell is empty")]
    EmptyLink { adapter: String },

    #[error("routine `{routine}` has no parameter `{param}`")]
    UnknownParameter { routine: String, param: String },

    #[error("routine `{routine}` did not produce output `{param}` for row {row}")]
    MissingOutput {
        routine: String,
        param: String,
        row: usize,
    },

    #[error("routine `{routine}` failed at row {row}: {source}")]
    Routine {
        routine: String,
        row: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to parse selections: {0}")]
    Selections(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Element(#[from] ElementError),
}

impl From<LinkError> for BindingError {
    fn from(err: LinkError) -> Self {
        BindingError::Table(TableError::Link(err))
    }
}

impl BindingError {
    /// The link error behind this failure, if any.
    pub fn as_link_error(&self) -> Option<&LinkError> {
        match self {
            BindingError::Table(TableError::Link(err)) => Some(err),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BindingError::Cancelled)
    }
}
