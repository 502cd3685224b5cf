//! Error types for the Tabula library.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is the [`TabulaError`] enum. Query syntax problems are recoverable by the
//! caller; storage and commit failures are fatal to the current operation.

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Tabula operations.
#[derive(Error, Debug)]
pub enum TabulaError {
    /// I/O errors (file operations, missing directories, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage-related errors (unavailable or corrupt index files).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Index-related errors.
    #[error("Index error: {0}")]
    Index(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Query syntax errors (malformed query text). The index is unaffected.
    #[error("Query error: {0}")]
    Query(String),

    /// An argument was rejected before any work began.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A document source yielded no documents. Surfaced so the indexing
    /// caller can log a warning; never raised by the engine itself.
    #[error("Empty or missing source: {0}")]
    EmptySource(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TabulaError.
pub type Result<T> = std::result::Result<T, TabulaError>;

impl TabulaError {
    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        TabulaError::Storage(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        TabulaError::Index(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        TabulaError::Analysis(msg.into())
    }

    /// Create a new query syntax error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        TabulaError::Query(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TabulaError::InvalidArgument(msg.into())
    }

    /// Create a new empty source error.
    pub fn empty_source<S: Into<String>>(msg: S) -> Self {
        TabulaError::EmptySource(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TabulaError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TabulaError::index("Test index error");
        assert_eq!(error.to_string(), "Index error: Test index error");

        let error = TabulaError::query("unbalanced quotes");
        assert_eq!(error.to_string(), "Query error: unbalanced quotes");

        let error = TabulaError::invalid_argument("top_k must be positive");
        assert_eq!(
            error.to_string(),
            "Invalid argument: top_k must be positive"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let tabula_error = TabulaError::from(io_error);

        match tabula_error {
            TabulaError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
