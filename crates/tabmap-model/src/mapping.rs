//! Mapping types shared by the engine, the wizard and the front ends.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How an assignment entered the mapping state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentOrigin {
    /// Fixed default-preselection table.
    Default,
    /// Eager auto-match: field key equals the header ignoring case.
    AutoExact,
    /// Eager auto-match: normalized header equals normalized field key.
    AutoSimilar,
    /// Eager auto-match through the alias dictionary.
    AutoPattern,
    /// Operator picked the field by hand.
    Manual,
    /// Operator confirmed a surfaced suggestion.
    AcceptedSuggestion,
    /// Reused from a stored mapping template.
    Template,
}

impl AssignmentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::AutoExact => "AUTO_EXACT",
            Self::AutoSimilar => "AUTO_SIMILAR",
            Self::AutoPattern => "AUTO_PATTERN",
            Self::Manual => "MANUAL",
            Self::AcceptedSuggestion => "ACCEPTED_SUGGESTION",
            Self::Template => "TEMPLATE",
        }
    }

    /// True for assignments produced without operator action.
    pub fn is_automatic(&self) -> bool {
        matches!(self, Self::AutoExact | Self::AutoSimilar | Self::AutoPattern)
    }
}

impl fmt::Display for AssignmentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One header-to-field assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingAssignment {
    pub header: String,
    pub field_key: String,
    pub origin: AssignmentOrigin,
    /// Confidence (0-100) attached to the assignment.
    pub confidence: u8,
    /// Why the assignment exists, for display.
    pub rationale: String,
}

/// Matching strategy that produced a suggestion.
///
/// Variant order is precedence order: `Exact` beats `Similar` beats `Pattern`
/// beats `Weak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    Exact,
    Similar,
    Pattern,
    Weak,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "EXACT",
            Self::Similar => "SIMILAR",
            Self::Pattern => "PATTERN",
            Self::Weak => "WEAK",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lower-ranked field worth offering next to a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub field_key: String,
    pub confidence: u8,
    pub rationale: String,
}

/// A proposed target field for one unresolved header.
///
/// Suggestions are derived data: they are recomputed from the header list,
/// the mapping state and the dismissals, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub header: String,
    /// Proposed field; `None` for unrecognized headers.
    pub candidate_field: Option<String>,
    pub confidence: u8,
    pub tier: MatchTier,
    pub rationale: String,
    pub example: String,
    pub category: String,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

impl Suggestion {
    /// Weak suggestions are display-only and can never be accepted.
    pub fn is_actionable(&self) -> bool {
        self.tier != MatchTier::Weak && self.candidate_field.is_some()
    }
}

/// Outcome of the minimum-set check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Required fields with no header assigned, in catalog order.
    pub missing_required_fields: Vec<String>,
    pub total_mapped: usize,
    pub total_headers: usize,
}

/// Frozen entry of a completed mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedField {
    pub field_key: String,
    pub confidence: u8,
    pub rationale: String,
    pub origin: AssignmentOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingStatistics {
    pub total_headers: usize,
    pub mapped_headers: usize,
    pub unmapped_headers: usize,
    pub required_fields_mapped: usize,
    /// Rounded mean confidence over mapped headers; 0 when nothing is mapped.
    pub average_confidence: u8,
}

/// Wizard output handed from the mapping stage to preview and commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    pub mapping: BTreeMap<String, MappedField>,
    pub statistics: MappingStatistics,
}

impl MappingResult {
    /// Plain header-to-field view sent to the transform and commit services.
    pub fn field_map(&self) -> BTreeMap<String, String> {
        self.mapping
            .iter()
            .map(|(header, mapped)| (header.clone(), mapped.field_key.clone()))
            .collect()
    }

    /// Header assigned to a field, if any.
    pub fn header_for(&self, field_key: &str) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(_, mapped)| mapped.field_key == field_key)
            .map(|(header, _)| header.as_str())
    }
}
