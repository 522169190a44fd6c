use slideset_common::ElementError;
use slideset_table::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported document version {found} (this build reads up to {supported})")]
    Version { found: u32, supported: u32 },

    #[error("table `{table}`: {source}")]
    Table {
        table: String,
        #[source]
        source: TableError,
    },

    #[error("table `{table}`, column `{column}`, row {row}: {source}")]
    Cell {
        table: String,
        column: String,
        row: usize,
        #[source]
        source: ElementError,
    },

    #[error("{backend}: {message}")]
    Backend { backend: String, message: String },
}

impl IoError {
    pub(crate) fn table(table: &str, source: TableError) -> Self {
        IoError::Table {
            table: table.to_string(),
            source,
        }
    }
}
