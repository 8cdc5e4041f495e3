//! Minimum viable field set check.

use tabmap_catalog::FieldCatalog;
use tabmap_model::ValidationResult;

use crate::state::MappingStore;

/// Checks a mapping against the catalog's required fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinimumSetValidator {
    required: Vec<String>,
}

impl MinimumSetValidator {
    pub fn new(catalog: &FieldCatalog) -> Self {
        Self {
            required: catalog.required_keys().map(str::to_string).collect(),
        }
    }

    pub fn with_required(required: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Required fields with no header assigned, in catalog order.
    pub fn validate(&self, mapping: &MappingStore, total_headers: usize) -> ValidationResult {
        let missing_required_fields: Vec<String> = self
            .required
            .iter()
            .filter(|field| !mapping.is_field_taken(field))
            .cloned()
            .collect();
        ValidationResult {
            is_valid: missing_required_fields.is_empty(),
            missing_required_fields,
            total_mapped: mapping.len(),
            total_headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_missing_required_field_flips_validity() {
        let validator = MinimumSetValidator::with_required(["playerId", "session_date"]);
        let mut store = MappingStore::new();

        let result = validator.validate(&store, 3);
        assert!(!result.is_valid);
        assert_eq!(result.missing_required_fields, vec!["playerId", "session_date"]);

        store.assign("Player", "playerId").unwrap();
        store.assign("Speed", "avg_speed_kmh").unwrap();
        let result = validator.validate(&store, 3);
        assert!(!result.is_valid);
        assert_eq!(result.missing_required_fields, vec!["session_date"]);

        store.assign("Date", "session_date").unwrap();
        let result = validator.validate(&store, 3);
        assert!(result.is_valid);
        assert_eq!(result.total_mapped, 3);
    }
}
