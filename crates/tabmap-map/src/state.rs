//! Mapping state for one file: the authoritative header → field table.
//!
//! The store keeps the assignment injective: a field key is held by at most
//! one header at a time, and a conflicting assignment fails without touching
//! the existing state.

use std::collections::{BTreeMap, BTreeSet};

use tabmap_catalog::{DefaultPreselection, FieldCatalog, default_preselection};
use tabmap_model::{
    AssignmentOrigin, MappedField, MappingAssignment, MappingResult, MappingStatistics,
};
use tracing::{debug, warn};

use crate::dismissal::DismissalTracker;
use crate::engine::{EXACT_CONFIDENCE, SIMILAR_CONFIDENCE, exact_match, similar_match};
use crate::error::{MappingError, Result};
use crate::patterns::{ALIAS_CONFIDENCE, alias_target};
use crate::repository::MappingTemplate;
use crate::utils::normalize;

/// Confidence recorded for operator, default and template assignments.
pub const FULL_CONFIDENCE: u8 = 100;

#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    /// Header → assignment.
    assignments: BTreeMap<String, MappingAssignment>,
    /// Field key → header, the reverse index enforcing injectivity.
    holders: BTreeMap<String, String>,
    /// Field keys filled by eager auto-matching, for highlighting.
    auto_mapped: BTreeSet<String>,
    /// Headers the default table marks as "do not map".
    do_not_map: BTreeSet<String>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator assignment (origin `MANUAL`).
    pub fn assign(&mut self, header: &str, field_key: &str) -> Result<&MappingAssignment> {
        self.assign_with(MappingAssignment {
            header: header.to_string(),
            field_key: field_key.to_string(),
            origin: AssignmentOrigin::Manual,
            confidence: FULL_CONFIDENCE,
            rationale: "Manual mapping".to_string(),
        })
    }

    /// Record an assignment with an explicit origin.
    ///
    /// Fails with [`MappingError::Conflict`] when another header already
    /// holds the field. Re-assigning a header moves it to the new field.
    pub fn assign_with(&mut self, assignment: MappingAssignment) -> Result<&MappingAssignment> {
        if let Some(holder) = self.holders.get(&assignment.field_key)
            && holder != &assignment.header
        {
            warn!(
                header = %assignment.header,
                field = %assignment.field_key,
                holder = %holder,
                "field already mapped"
            );
            return Err(MappingError::Conflict {
                field_key: assignment.field_key,
                holder: holder.clone(),
            });
        }

        if let Some(previous) = self.assignments.get(&assignment.header)
            && previous.field_key != assignment.field_key
        {
            let old_field = previous.field_key.clone();
            self.holders.remove(&old_field);
            self.auto_mapped.remove(&old_field);
        }
        if assignment.origin.is_automatic() {
            self.auto_mapped.insert(assignment.field_key.clone());
        } else {
            self.auto_mapped.remove(&assignment.field_key);
        }
        if assignment.origin != AssignmentOrigin::Default {
            self.do_not_map.remove(&assignment.header);
        }

        debug!(
            header = %assignment.header,
            field = %assignment.field_key,
            origin = %assignment.origin,
            "assigned field"
        );
        let header = assignment.header.clone();
        self.holders
            .insert(assignment.field_key.clone(), header.clone());
        self.assignments.insert(header.clone(), assignment);
        Ok(&self.assignments[&header])
    }

    /// Remove the header's assignment and reinstate it for suggestions.
    ///
    /// An explicit un-map means "changed my mind", not "never suggest again".
    pub fn clear(
        &mut self,
        header: &str,
        dismissals: &mut DismissalTracker,
    ) -> Option<MappingAssignment> {
        dismissals.reinstate(header);
        let removed = self.assignments.remove(header)?;
        self.holders.remove(&removed.field_key);
        self.auto_mapped.remove(&removed.field_key);
        debug!(header, field = %removed.field_key, "cleared mapping");
        Some(removed)
    }

    /// Apply the fixed default-preselection table.
    ///
    /// Never overrides an existing assignment or a taken field.
    pub fn seed_defaults(&mut self, headers: &[String]) -> Vec<MappingAssignment> {
        let mut applied = Vec::new();
        for header in headers {
            if self.is_assigned(header) {
                continue;
            }
            match default_preselection(header) {
                Some(DefaultPreselection::Field(field_key)) => {
                    if self.is_field_taken(field_key) {
                        continue;
                    }
                    let assignment = MappingAssignment {
                        header: header.clone(),
                        field_key: field_key.to_string(),
                        origin: AssignmentOrigin::Default,
                        confidence: FULL_CONFIDENCE,
                        rationale: "Default preselection".to_string(),
                    };
                    if let Ok(done) = self.assign_with(assignment) {
                        applied.push(done.clone());
                    }
                }
                Some(DefaultPreselection::DoNotMap) => {
                    debug!(header = %header, "default preselection: do not map");
                    self.do_not_map.insert(header.clone());
                }
                None => {}
            }
        }
        applied
    }

    /// Eagerly commit exact, similar and alias matches for unassigned headers.
    ///
    /// Regex pattern rules are left to the suggestion engine, where they need
    /// confirmation. Headers marked "do not map" are skipped.
    pub fn apply_auto_matches(
        &mut self,
        headers: &[String],
        catalog: &FieldCatalog,
    ) -> Vec<MappingAssignment> {
        let mut applied = Vec::new();
        for header in headers {
            if self.is_assigned(header) {
                continue;
            }
            if self.do_not_map.contains(header) {
                debug!(header = %header, "skipping auto-match for do-not-map column");
                continue;
            }
            let Some(assignment) = self.auto_match(header, catalog) else {
                continue;
            };
            match self.assign_with(assignment) {
                Ok(done) => applied.push(done.clone()),
                Err(err) => warn!(header = %header, error = %err, "auto-match skipped"),
            }
        }
        if !applied.is_empty() {
            debug!(count = applied.len(), "applied auto-matches");
        }
        applied
    }

    fn auto_match(&self, header: &str, catalog: &FieldCatalog) -> Option<MappingAssignment> {
        let available = |key: &str| !self.is_field_taken(key);
        let build = |field_key: &str, origin, confidence, rationale: &str| MappingAssignment {
            header: header.to_string(),
            field_key: field_key.to_string(),
            origin,
            confidence,
            rationale: rationale.to_string(),
        };
        if let Some(field) = exact_match(catalog, header, &available) {
            return Some(build(
                &field.key,
                AssignmentOrigin::AutoExact,
                EXACT_CONFIDENCE,
                "Exact match",
            ));
        }
        if let Some(field) = similar_match(catalog, header, &available) {
            return Some(build(
                &field.key,
                AssignmentOrigin::AutoSimilar,
                SIMILAR_CONFIDENCE,
                "Similar match",
            ));
        }
        alias_target(&normalize(header))
            .filter(|key| catalog.contains(key) && available(*key))
            .map(|key| {
                build(
                    key,
                    AssignmentOrigin::AutoPattern,
                    ALIAS_CONFIDENCE,
                    "Common column name",
                )
            })
    }

    /// Reuse a stored template for headers that are still unassigned.
    ///
    /// Template entries are matched on normalized header text; entries
    /// naming unknown fields or fields already taken are skipped.
    pub fn apply_template(
        &mut self,
        headers: &[String],
        template: &MappingTemplate,
        catalog: &FieldCatalog,
    ) -> Vec<MappingAssignment> {
        let mut applied = Vec::new();
        for header in headers {
            if self.is_assigned(header) {
                continue;
            }
            let Some(field_key) = template.field_for(header) else {
                continue;
            };
            if !catalog.contains(field_key) && !tabmap_model::is_custom_field(field_key) {
                debug!(header = %header, field = %field_key, "template field unknown");
                continue;
            }
            let assignment = MappingAssignment {
                header: header.clone(),
                field_key: field_key.to_string(),
                origin: AssignmentOrigin::Template,
                confidence: FULL_CONFIDENCE,
                rationale: "Saved mapping template".to_string(),
            };
            match self.assign_with(assignment) {
                Ok(done) => applied.push(done.clone()),
                Err(err) => debug!(header = %header, error = %err, "template entry skipped"),
            }
        }
        applied
    }

    pub fn get(&self, header: &str) -> Option<&MappingAssignment> {
        self.assignments.get(header)
    }

    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.assignments.get(header).map(|a| a.field_key.as_str())
    }

    pub fn holder_of(&self, field_key: &str) -> Option<&str> {
        self.holders.get(field_key).map(String::as_str)
    }

    pub fn is_assigned(&self, header: &str) -> bool {
        self.assignments.contains_key(header)
    }

    pub fn is_field_taken(&self, field_key: &str) -> bool {
        self.holders.contains_key(field_key)
    }

    pub fn is_do_not_map(&self, header: &str) -> bool {
        self.do_not_map.contains(header)
    }

    pub fn is_auto_mapped(&self, field_key: &str) -> bool {
        self.auto_mapped.contains(field_key)
    }

    pub fn auto_mapped(&self) -> &BTreeSet<String> {
        &self.auto_mapped
    }

    /// Assignments ordered by header.
    pub fn assignments(&self) -> impl Iterator<Item = &MappingAssignment> {
        self.assignments.values()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Header → field key.
    pub fn field_map(&self) -> BTreeMap<String, String> {
        self.assignments
            .iter()
            .map(|(header, a)| (header.clone(), a.field_key.clone()))
            .collect()
    }

    /// Freeze the current state into a [`MappingResult`].
    pub fn snapshot(&self, headers: &[String], catalog: &FieldCatalog) -> MappingResult {
        let mapping: BTreeMap<String, MappedField> = self
            .assignments
            .iter()
            .map(|(header, a)| {
                (
                    header.clone(),
                    MappedField {
                        field_key: a.field_key.clone(),
                        confidence: a.confidence,
                        rationale: a.rationale.clone(),
                        origin: a.origin,
                    },
                )
            })
            .collect();

        let mapped_headers = mapping.len();
        let total: u32 = mapping.values().map(|m| u32::from(m.confidence)).sum();
        let average_confidence = if mapped_headers == 0 {
            0
        } else {
            let avg = (f64::from(total) / mapped_headers as f64).round();
            avg.clamp(0.0, 100.0) as u8
        };
        let required_fields_mapped = catalog
            .required_keys()
            .filter(|key| self.is_field_taken(key))
            .count();

        MappingResult {
            mapping,
            statistics: MappingStatistics {
                total_headers: headers.len(),
                mapped_headers,
                unmapped_headers: headers.len().saturating_sub(mapped_headers),
                required_fields_mapped,
                average_confidence,
            },
        }
    }
}
