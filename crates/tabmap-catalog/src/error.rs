//! Error types for catalog loading.

use std::path::PathBuf;

use tabmap_model::ModelError;
use thiserror::Error;

/// Errors that can occur while building a field catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Row could not be parsed.
    #[error("Failed to parse catalog {file}: {message}")]
    CsvParse { file: String, message: String },

    /// Invalid value in a CSV column.
    #[error("Invalid {column} value '{value}' in {file}")]
    InvalidValue {
        column: &'static str,
        value: String,
        file: String,
    },

    /// The same key appears twice.
    #[error("Duplicate field key '{0}'")]
    DuplicateKey(String),

    /// No fields were loaded.
    #[error("Catalog {0} defines no fields")]
    Empty(String),

    /// Custom field label rejected.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
