//! Error types for dataset encoding, training, and evaluation

use lagpipe_frame::FrameError;
use thiserror::Error;

/// Errors raised by the regression collaborator
#[derive(Debug, Error)]
pub enum ModelError {
    /// No rows to train or score on
    #[error("dataset is empty")]
    EmptyDataset,

    /// Predicted and actual value sequences differ in length
    #[error("length mismatch: {predicted} predictions vs {actual} actuals")]
    LengthMismatch { predicted: usize, actual: usize },

    /// A cell that should have been imputed upstream is still missing
    #[error("missing value in column '{column}' at row {row}; imputation runs upstream")]
    MissingValue { column: String, row: usize },

    /// Data model violation
    #[error("data model error: {0}")]
    Frame(#[from] FrameError),

    /// Model (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
