//! Similarity ranking for the manual field picker.
//!
//! Uses Jaro-Winkler similarity between the normalized header and each
//! field's normalized key and label. Ranking only orders the picker; it never
//! produces suggestions or assignments.

use std::cmp::Ordering;

use rapidfuzz::distance::jaro_winkler;
use tabmap_catalog::FieldCatalog;

use crate::utils::normalize;

/// One catalog field with its similarity to a header.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedField {
    pub key: String,
    pub label: String,
    pub category: String,
    /// Similarity in `0.0..=1.0`.
    pub score: f64,
}

/// Catalog fields ordered by similarity to `header`, best first.
///
/// Ties keep catalog order.
pub fn rank_fields(catalog: &FieldCatalog, header: &str) -> Vec<RankedField> {
    let normalized = normalize(header);
    let mut ranked: Vec<RankedField> = catalog
        .iter()
        .map(|field| {
            let key_score = jaro_winkler::similarity(
                normalized.chars(),
                normalize(&field.key).chars(),
            );
            let label_score = jaro_winkler::similarity(
                normalized.chars(),
                normalize(&field.label).chars(),
            );
            RankedField {
                key: field.key.clone(),
                label: field.label.clone(),
                category: field.category.clone(),
                score: key_score.max(label_score),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_field_ranks_first() {
        let catalog = FieldCatalog::embedded().unwrap();
        let ranked = rank_fields(&catalog, "Top Spd");
        assert_eq!(ranked.len(), catalog.len());
        assert_eq!(ranked[0].key, "top_speed_kmh");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn punctuation_does_not_affect_rank() {
        let catalog = FieldCatalog::embedded().unwrap();
        let ranked = rank_fields(&catalog, "Max Heart-Rate (bpm)");
        assert_eq!(ranked[0].key, "max_heart_rate");
    }
}
