//! Error types for mapping operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from mapping operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MappingError {
    /// Field already assigned to a different header.
    #[error("Field '{field_key}' is already mapped from column '{holder}'")]
    Conflict {
        /// The field that was requested.
        field_key: String,
        /// The header currently holding it.
        holder: String,
    },

    /// Field key is neither in the catalog nor a custom field.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Header is not part of the active file.
    #[error("Column not found: {0}")]
    UnknownHeader(String),

    /// No suggestion is currently surfaced for the header.
    #[error("No suggestion available for column '{0}'")]
    NoSuggestion(String),

    /// Weak suggestions are informational only.
    #[error("Suggestion for column '{header}' ({confidence}%) cannot be accepted")]
    NotActionable { header: String, confidence: u8 },

    /// Thresholds must be ordered and at most 100.
    #[error(
        "Invalid thresholds: surface {surface_min} <= pending {pending_min} <= accept-all {accept_all_min} <= 100 must hold"
    )]
    InvalidThresholds {
        surface_min: u8,
        pending_min: u8,
        accept_all_min: u8,
    },

    /// Template file could not be read or written.
    #[error("Template store error at {path}: {message}")]
    TemplateIo { path: PathBuf, message: String },

    /// Template file is not valid JSON.
    #[error("Invalid template {path}: {message}")]
    TemplateFormat { path: PathBuf, message: String },

    /// Dismissal state file could not be read or written.
    #[error("Dismissal state error at {path}: {message}")]
    StateIo { path: PathBuf, message: String },

    /// Dismissal state file is not valid JSON.
    #[error("Invalid dismissal state {path}: {message}")]
    StateFormat { path: PathBuf, message: String },
}

impl MappingError {
    /// Get the field key associated with this error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Conflict { field_key, .. } => Some(field_key),
            Self::UnknownField(f) => Some(f),
            _ => None,
        }
    }

    /// Get the header associated with this error, if any.
    pub fn header(&self) -> Option<&str> {
        match self {
            Self::Conflict { holder, .. } => Some(holder),
            Self::UnknownHeader(h) | Self::NoSuggestion(h) => Some(h),
            Self::NotActionable { header, .. } => Some(header),
            _ => None,
        }
    }

    /// Whether the operator can fix this by choosing differently.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. }
                | Self::UnknownField(_)
                | Self::UnknownHeader(_)
                | Self::NoSuggestion(_)
                | Self::NotActionable { .. }
        )
    }
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;
