//! Error types for the fraud scoring engine

use thiserror::Error;

/// Errors surfaced by the scoring core.
#[derive(Debug, Error)]
pub enum FraudError {
    /// An enum tag (merchant category, transaction type) did not match any
    /// known variant.
    #[error("invalid {field} tag: {value:?}")]
    Validation { field: &'static str, value: String },

    /// A timestamp string could not be parsed as ISO-8601.
    #[error("malformed timestamp: {0}")]
    Parse(#[from] chrono::ParseError),

    /// The ML ensemble was queried before `train` or `load` completed.
    #[error("models have not been trained")]
    NotTrained,

    /// A training call received no samples, or mismatched feature/label
    /// lengths.
    #[error("invalid training set: {0}")]
    Training(String),

    /// A persisted model file did not match the expected structure.
    #[error("malformed model file: {0}")]
    ModelFormat(String),

    /// Reading or writing a model file failed.
    #[error("model file I/O: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FraudError>;
