//! Tiered header matching and suggestion generation.
//!
//! Matching runs exact → similar → pattern and falls back to an
//! informational weak entry. The same tier matchers back both the eager
//! auto-matching in [`crate::state::MappingStore`] and the interactive
//! [`SuggestionGenerator`].

use tabmap_catalog::FieldCatalog;
use tabmap_model::{
    Alternative, CUSTOM_CATEGORY, FieldDefinition, MatchTier, Suggestion, is_custom_field,
};
use tracing::debug;

use crate::dismissal::DismissalTracker;
use crate::error::{MappingError, Result};
use crate::patterns::{ALTERNATIVE_FAMILIES, PATTERN_RULES, PatternRule};
use crate::state::MappingStore;
use crate::utils::normalize;

/// Confidence of an exact (case-insensitive) key match.
pub const EXACT_CONFIDENCE: u8 = 95;
/// Confidence of a normalized key match.
pub const SIMILAR_CONFIDENCE: u8 = 85;
/// Confidence of the informational fallback.
pub const WEAK_CONFIDENCE: u8 = 50;
/// Confidence attached to alternatives.
pub const ALTERNATIVE_CONFIDENCE: u8 = 70;
/// Maximum alternatives listed per suggestion.
pub const MAX_ALTERNATIVES: usize = 3;

/// Category shown for headers nothing matched.
pub const UNRECOGNIZED_CATEGORY: &str = "Unrecognized";

/// Confidence boundaries that decide what the operator sees.
///
/// - Below `surface_min`: not surfaced
/// - `surface_min` to `pending_min`: surfaced, needs manual search to confirm
/// - At or above `pending_min`: auto-proposed, one-click confirmation
/// - At or above `accept_all_min`: included in bulk accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchThresholds {
    pub surface_min: u8,
    pub pending_min: u8,
    pub accept_all_min: u8,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            surface_min: 60,
            pending_min: 75,
            accept_all_min: 85,
        }
    }
}

impl MatchThresholds {
    /// Check `surface_min <= pending_min <= accept_all_min <= 100`.
    pub fn validate(&self) -> Result<()> {
        if self.surface_min <= self.pending_min
            && self.pending_min <= self.accept_all_min
            && self.accept_all_min <= 100
        {
            Ok(())
        } else {
            Err(MappingError::InvalidThresholds {
                surface_min: self.surface_min,
                pending_min: self.pending_min,
                accept_all_min: self.accept_all_min,
            })
        }
    }
}

/// A tier hit for one header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierMatch {
    pub field_key: String,
    pub tier: MatchTier,
    pub confidence: u8,
    pub rationale: String,
}

/// Field whose key equals the header ignoring case.
pub fn exact_match<'a>(
    catalog: &'a FieldCatalog,
    header: &str,
    available: &dyn Fn(&str) -> bool,
) -> Option<&'a FieldDefinition> {
    let trimmed = header.trim();
    catalog
        .iter()
        .find(|field| field.key.eq_ignore_ascii_case(trimmed) && available(&field.key))
}

/// Field whose normalized key equals the normalized header.
pub fn similar_match<'a>(
    catalog: &'a FieldCatalog,
    header: &str,
    available: &dyn Fn(&str) -> bool,
) -> Option<&'a FieldDefinition> {
    let normalized = normalize(header);
    if normalized.is_empty() {
        return None;
    }
    catalog
        .iter()
        .find(|field| normalize(&field.key) == normalized && available(&field.key))
}

/// First pattern rule that matches and whose target is free.
///
/// Targets must be catalog fields or synthetic custom fields.
pub fn pattern_match(
    catalog: &FieldCatalog,
    header: &str,
    available: &dyn Fn(&str) -> bool,
) -> Option<&'static PatternRule> {
    PATTERN_RULES.iter().find(|rule| {
        (catalog.contains(rule.target) || is_custom_field(rule.target))
            && available(rule.target)
            && rule.matches(header)
    })
}

/// Run exact → similar → pattern for one header.
pub fn match_header(
    catalog: &FieldCatalog,
    header: &str,
    available: &dyn Fn(&str) -> bool,
) -> Option<TierMatch> {
    if let Some(field) = exact_match(catalog, header, available) {
        return Some(TierMatch {
            field_key: field.key.clone(),
            tier: MatchTier::Exact,
            confidence: EXACT_CONFIDENCE,
            rationale: "Exact match".to_string(),
        });
    }
    if let Some(field) = similar_match(catalog, header, available) {
        return Some(TierMatch {
            field_key: field.key.clone(),
            tier: MatchTier::Similar,
            confidence: SIMILAR_CONFIDENCE,
            rationale: "Similar match".to_string(),
        });
    }
    pattern_match(catalog, header, available).map(|rule| TierMatch {
        field_key: rule.target.to_string(),
        tier: MatchTier::Pattern,
        confidence: rule.confidence,
        rationale: rule.rationale.to_string(),
    })
}

/// Suggestions for one pass over the header list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionSet {
    /// Actionable suggestions at or above `surface_min`, in header order.
    pub surfaced: Vec<Suggestion>,
    /// Weak entries for headers nothing matched; display only.
    pub unrecognized: Vec<Suggestion>,
    thresholds: MatchThresholds,
}

impl SuggestionSet {
    pub fn get(&self, header: &str) -> Option<&Suggestion> {
        self.surfaced
            .iter()
            .chain(self.unrecognized.iter())
            .find(|s| s.header == header)
    }

    /// Surfaced suggestions awaiting one-click confirmation.
    pub fn pending(&self) -> impl Iterator<Item = &Suggestion> {
        let min = self.thresholds.pending_min;
        self.surfaced.iter().filter(move |s| s.confidence >= min)
    }

    /// Surfaced suggestions eligible for bulk accept.
    pub fn accept_all_candidates(&self) -> impl Iterator<Item = &Suggestion> {
        let min = self.thresholds.accept_all_min;
        self.surfaced.iter().filter(move |s| s.confidence >= min)
    }

    pub fn is_empty(&self) -> bool {
        self.surfaced.is_empty() && self.unrecognized.is_empty()
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }
}

/// Proposes target fields for headers that are neither assigned nor dismissed.
///
/// Pure: reads the mapping state and dismissals, never mutates them.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionGenerator<'a> {
    catalog: &'a FieldCatalog,
    thresholds: MatchThresholds,
}

impl<'a> SuggestionGenerator<'a> {
    pub fn new(catalog: &'a FieldCatalog, thresholds: MatchThresholds) -> Self {
        Self {
            catalog,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Generate suggestions for every eligible header.
    pub fn generate(
        &self,
        headers: &[String],
        mapping: &MappingStore,
        dismissed: &DismissalTracker,
    ) -> SuggestionSet {
        let mut set = SuggestionSet {
            thresholds: self.thresholds,
            ..SuggestionSet::default()
        };
        for header in headers {
            if mapping.is_assigned(header) || dismissed.is_dismissed(header) {
                continue;
            }
            let suggestion = self.suggest(header, mapping);
            if suggestion.is_actionable() && suggestion.confidence >= self.thresholds.surface_min {
                set.surfaced.push(suggestion);
            } else {
                set.unrecognized.push(suggestion);
            }
        }
        debug!(
            headers = headers.len(),
            surfaced = set.surfaced.len(),
            pending = set.pending().count(),
            unrecognized = set.unrecognized.len(),
            "generated suggestions"
        );
        set
    }

    /// Build the suggestion for one header against the current mapping.
    pub fn suggest(&self, header: &str, mapping: &MappingStore) -> Suggestion {
        let available = |key: &str| !mapping.is_field_taken(key);
        match match_header(self.catalog, header, &available) {
            Some(hit) => {
                debug!(
                    header,
                    field = %hit.field_key,
                    tier = %hit.tier,
                    confidence = hit.confidence,
                    "matched header"
                );
                let (example, category) = match self.catalog.get(&hit.field_key) {
                    Some(field) => (field.example.clone(), field.category.clone()),
                    None => (String::new(), CUSTOM_CATEGORY.to_string()),
                };
                let alternatives = self.alternatives(header, &hit.field_key, &available);
                Suggestion {
                    header: header.to_string(),
                    candidate_field: Some(hit.field_key),
                    confidence: hit.confidence,
                    tier: hit.tier,
                    rationale: hit.rationale,
                    example,
                    category,
                    alternatives,
                }
            }
            None => {
                debug!(header, "no field matched header");
                Suggestion {
                    header: header.to_string(),
                    candidate_field: None,
                    confidence: WEAK_CONFIDENCE,
                    tier: MatchTier::Weak,
                    rationale: "No matching field found".to_string(),
                    example: String::new(),
                    category: UNRECOGNIZED_CATEGORY.to_string(),
                    alternatives: Vec::new(),
                }
            }
        }
    }

    /// Free fields sharing a metric family keyword with the header.
    fn alternatives(
        &self,
        header: &str,
        chosen: &str,
        available: &dyn Fn(&str) -> bool,
    ) -> Vec<Alternative> {
        let header_lower = header.to_lowercase();
        let mut out = Vec::new();
        for field in self.catalog.iter() {
            if field.key == chosen || !available(&field.key) {
                continue;
            }
            let key_lower = field.key.to_lowercase();
            if let Some((_, rationale)) = ALTERNATIVE_FAMILIES
                .iter()
                .find(|(family, _)| key_lower.contains(family) && header_lower.contains(family))
            {
                out.push(Alternative {
                    field_key: field.key.clone(),
                    confidence: ALTERNATIVE_CONFIDENCE,
                    rationale: (*rationale).to_string(),
                });
            }
            if out.len() == MAX_ALTERNATIVES {
                break;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::embedded().unwrap()
    }

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn thresholds_must_be_ordered() {
        assert!(MatchThresholds::default().validate().is_ok());
        let bad = MatchThresholds {
            surface_min: 80,
            pending_min: 75,
            accept_all_min: 85,
        };
        assert!(matches!(
            bad.validate(),
            Err(MappingError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn exact_beats_similar_beats_pattern() {
        let catalog = catalog();
        let free = |_: &str| true;

        let exact = match_header(&catalog, "TOTAL_DISTANCE_M", &free).unwrap();
        assert_eq!(exact.tier, MatchTier::Exact);
        assert_eq!(exact.confidence, EXACT_CONFIDENCE);

        let similar = match_header(&catalog, "Total Distance M", &free).unwrap();
        assert_eq!(similar.tier, MatchTier::Similar);
        assert_eq!(similar.field_key, "total_distance_m");

        let pattern = match_header(&catalog, "Dist_Total", &free).unwrap();
        assert_eq!(pattern.tier, MatchTier::Pattern);
        assert!(pattern.rationale.contains("distance"));
    }

    #[test]
    fn taken_fields_are_not_proposed() {
        let catalog = catalog();
        let taken = |key: &str| key != "total_distance_m";
        assert!(match_header(&catalog, "total_distance_m", &taken).is_none());
    }

    #[test]
    fn unmatched_header_is_weak_and_not_surfaced() {
        let catalog = catalog();
        let generator = SuggestionGenerator::new(&catalog, MatchThresholds::default());
        let set = generator.generate(
            &headers(&["Weather"]),
            &MappingStore::default(),
            &DismissalTracker::default(),
        );
        assert!(set.surfaced.is_empty());
        let weak = &set.unrecognized[0];
        assert_eq!(weak.tier, MatchTier::Weak);
        assert_eq!(weak.confidence, WEAK_CONFIDENCE);
        assert_eq!(weak.category, UNRECOGNIZED_CATEGORY);
        assert!(!weak.is_actionable());
    }

    #[test]
    fn distance_headers_list_distance_alternatives() {
        let catalog = catalog();
        let generator = SuggestionGenerator::new(&catalog, MatchThresholds::default());
        let suggestion = generator.suggest("Sprint Distance", &MappingStore::default());
        assert_eq!(
            suggestion.candidate_field.as_deref(),
            Some("sprint_distance_m")
        );
        assert_eq!(suggestion.alternatives.len(), MAX_ALTERNATIVES);
        assert!(
            suggestion
                .alternatives
                .iter()
                .all(|a| a.field_key.contains("distance") && a.confidence == 70)
        );
    }

    #[test]
    fn custom_pattern_target_uses_custom_category() {
        let catalog = catalog();
        let generator = SuggestionGenerator::new(&catalog, MatchThresholds::default());
        let suggestion = generator.suggest("RPE", &MappingStore::default());
        assert_eq!(suggestion.candidate_field.as_deref(), Some("custom.rpe"));
        assert_eq!(suggestion.category, CUSTOM_CATEGORY);
    }
}
