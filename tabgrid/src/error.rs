//! Error types.

use thiserror::Error;

/// Invalid column model. Raised once, at setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("duplicate column key '{key}'")]
    DuplicateKey { key: String },
    #[error("column at index {index} has an empty key")]
    EmptyKey { index: usize },
    #[error("column '{key}' has a zero default width")]
    ZeroWidth { key: String },
}

/// An import payload was rejected. The dataset is left untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("import must be a JSON array, found {found}")]
    NotAnArray { found: &'static str },
    #[error("record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Export could not produce the dataset.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("grid state is unavailable: a writer panicked")]
    Unavailable,
}

/// A bulk action could not run or its host action failed.
///
/// Either way the selection has been cleared by the time this is returned.
#[derive(Debug, Error)]
pub enum BulkActionError<E: std::error::Error + 'static> {
    #[error("no rows selected")]
    EmptySelection,
    #[error("bulk action failed: {0}")]
    Action(#[source] E),
}
