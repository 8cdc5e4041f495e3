//! Data model for mapping arbitrary tabular headers onto a fixed target schema.
//!
//! The types here carry no behavior beyond small helpers; matching, state
//! management and validation live in `tabmap-map`, the stage machine in
//! `tabmap-wizard`.

pub mod error;
pub mod field;
pub mod identity;
pub mod import;
pub mod mapping;

pub use error::{ModelError, Result};
pub use field::{
    CUSTOM_CATEGORY, CUSTOM_PREFIX, FieldDefinition, custom_field_key, is_custom_field,
};
pub use identity::FileIdentity;
pub use import::{
    AcquiredHeaders, CommitResponse, CommitSummary, FormatHint, PreviewResponse,
    PreviewStatistics, Record, RowError, TransformRequest,
};
pub use mapping::{
    Alternative, AssignmentOrigin, MappedField, MappingAssignment, MappingResult,
    MappingStatistics, MatchTier, Suggestion, ValidationResult,
};
