//! Error types for the import wizard.
//!
//! Local failures (conflicts, missing required fields, invalid transitions)
//! are raised by the wizard itself. Collaborator failures arrive as
//! [`UpstreamError`] and keep the wizard in its current stage.

use std::fmt;

use tabmap_catalog::CatalogError;
use tabmap_map::MappingError;
use thiserror::Error;

use crate::request::RequestKind;
use crate::stage::Stage;

/// Which collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    Acquire,
    Transform,
    Commit,
    /// Acquisition succeeded but returned no headers.
    NoHeadersFound,
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpstreamKind::Acquire => "Header acquisition failed",
            UpstreamKind::Transform => "Preview failed",
            UpstreamKind::Commit => "Commit failed",
            UpstreamKind::NoHeadersFound => "No headers found",
        })
    }
}

/// Failure reported by a collaborator. The message is kept verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct UpstreamError {
    pub kind: UpstreamKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn acquire(message: impl Into<String>) -> Self {
        Self::new(UpstreamKind::Acquire, message)
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::new(UpstreamKind::Transform, message)
    }

    pub fn commit(message: impl Into<String>) -> Self {
        Self::new(UpstreamKind::Commit, message)
    }

    pub fn no_headers(message: impl Into<String>) -> Self {
        Self::new(UpstreamKind::NoHeadersFound, message)
    }
}

/// Errors from wizard operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WizardError {
    /// The action is not available in the current stage.
    #[error("Cannot {action} while in stage '{from}'")]
    InvalidTransition { from: Stage, action: &'static str },

    /// Required fields have no header assigned.
    #[error("Required fields not mapped: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    /// A collaborator request failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A request of this kind is already outstanding.
    #[error("A {kind} request is already in progress")]
    Busy { kind: RequestKind },

    /// A response arrived for a request that is not (or no longer) in flight.
    #[error("No {kind} request is in flight")]
    NoRequestInFlight { kind: RequestKind },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Result type alias for wizard operations.
pub type Result<T> = std::result::Result<T, WizardError>;

impl WizardError {
    /// Whether the operator can fix the cause and try again in place.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation { .. } | Self::Upstream(_) | Self::Busy { .. } => true,
            Self::Mapping(err) => err.is_recoverable(),
            _ => false,
        }
    }

    /// A short hint on how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidTransition { .. } => Some("Reset the wizard to start a new import."),
            Self::Validation { .. } => {
                Some("Map a column to every required field before continuing.")
            }
            Self::Upstream(err) => match err.kind {
                UpstreamKind::NoHeadersFound => {
                    Some("Check that the file has a header row and is not empty.")
                }
                UpstreamKind::Acquire => Some("Check that the file is readable and retry."),
                UpstreamKind::Transform => Some("Retry, or go back and adjust the mapping."),
                UpstreamKind::Commit => Some("Retry the commit or start a new import."),
            },
            Self::Busy { .. } => Some("Wait for the current request to finish."),
            Self::Mapping(MappingError::Conflict { .. }) => {
                Some("Unmap the column holding the field before remapping it.")
            }
            Self::Mapping(MappingError::NotActionable { .. }) => {
                Some("Pick the field manually for unrecognized columns.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_verbatim() {
        let err = WizardError::from(UpstreamError::transform("row 3: bad date '31/02'"));
        assert_eq!(err.to_string(), "Preview failed: row 3: bad date '31/02'");
        assert!(err.is_recoverable());
    }

    #[test]
    fn validation_lists_missing_fields() {
        let err = WizardError::Validation {
            missing: vec!["playerId".to_string(), "session_date".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Required fields not mapped: playerId, session_date"
        );
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn conflict_passes_through_mapping_error() {
        let err = WizardError::from(MappingError::Conflict {
            field_key: "total_distance_m".to_string(),
            holder: "A".to_string(),
        });
        assert!(err.to_string().contains("'A'"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn invalid_transition_is_not_recoverable() {
        let err = WizardError::InvalidTransition {
            from: Stage::Committed,
            action: "go back",
        };
        assert_eq!(err.to_string(), "Cannot go back while in stage 'committed'");
        assert!(!err.is_recoverable());
    }
}
