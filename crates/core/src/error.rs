//! Error types for grounded.
//!
//! A single error enum covers configuration, I/O, inference backends,
//! knowledge-base integrity, prompts and serialization.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for grounded.
///
/// Every fallible function returns `Result<T, AppError>`. The answer path
/// converts backend failures into fallback values instead of returning them.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An embedding or generation endpoint could not produce a usable result
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Ingestion found no source files
    #[error("No source files found under {path:?}")]
    EmptyCorpus { path: PathBuf },

    /// A vector of the wrong length was presented to a vector index
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Knowledge base integrity and artifact errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
