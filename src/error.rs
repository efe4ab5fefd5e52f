//! Error types for the bracken-merge library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column '{column}' in {path:?}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Invalid read count '{value}' for taxon '{taxon}' in {path:?}")]
    InvalidCount {
        value: String,
        taxon: String,
        path: PathBuf,
    },

    #[error("Input directory not found: {0:?}")]
    InputDirMissing(PathBuf),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MergeError>;
