//! Error types for the data model

use thiserror::Error;

/// Errors raised while constructing or reshaping tabular data
#[derive(Debug, Error)]
pub enum FrameError {
    /// Columns in one chunk or table have differing row counts
    #[error("ragged columns: column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share a name
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A named column is not present
    #[error("missing column '{0}'")]
    MissingColumn(String),
}

/// Result type for data model operations
pub type Result<T> = std::result::Result<T, FrameError>;
