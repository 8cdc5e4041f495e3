use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Prefix shared by every operator-defined target field.
pub const CUSTOM_PREFIX: &str = "custom.";

/// Category assigned to custom fields.
pub const CUSTOM_CATEGORY: &str = "Custom";

/// A target field of the destination schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique field key (e.g. `total_distance_m`).
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// Whether the field belongs to the minimum viable set.
    pub required: bool,
    /// Display grouping (e.g. "Performance").
    pub category: String,
    /// Example value shown next to suggestions.
    pub example: String,
    /// Longer description for the manual picker.
    #[serde(default)]
    pub description: String,
}

impl FieldDefinition {
    /// Build a custom field definition from a free-text label.
    pub fn custom(label: &str) -> Result<Self> {
        let key = custom_field_key(label)?;
        Ok(Self {
            key,
            label: format!("{} (custom)", label.trim()),
            required: false,
            category: CUSTOM_CATEGORY.to_string(),
            example: String::new(),
            description: String::new(),
        })
    }

    pub fn is_custom(&self) -> bool {
        is_custom_field(&self.key)
    }
}

/// Returns true if the key names an operator-defined field.
pub fn is_custom_field(key: &str) -> bool {
    key.strip_prefix(CUSTOM_PREFIX)
        .is_some_and(|slug| !slug.is_empty())
}

/// Derive the `custom.<slug>` key for a label.
///
/// Whitespace runs become `_`; anything outside `[a-z0-9_]` is dropped.
pub fn custom_field_key(label: &str) -> Result<String> {
    let lowered = label.trim().to_lowercase();
    let slug: String = lowered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '_')
        .collect();
    if slug.trim_matches('_').is_empty() {
        return Err(ModelError::EmptyCustomSlug(label.to_string()));
    }
    Ok(format!("{CUSTOM_PREFIX}{slug}"))
}
