//! One import session: the header list of a file and every decision made
//! about it.
//!
//! All mutation goes through the session so validation and suggestion
//! staleness stay in step with the mapping. Validation is recomputed after
//! every change; suggestions are rebuilt through the [`RecomputeScheduler`].

use tabmap_catalog::FieldCatalog;
use tabmap_map::{
    DismissalTracker, MappingError, MappingStore, MatchThresholds, MinimumSetValidator,
    RankedField, SuggestionGenerator, SuggestionSet, TemplateMatch, TemplateMatchKind,
    rank_fields,
};
use tabmap_model::{
    AcquiredHeaders, AssignmentOrigin, FieldDefinition, FileIdentity, MappingAssignment,
    MappingResult, MatchTier, Suggestion, ValidationResult,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::scheduler::{RecomputeConfig, RecomputeScheduler};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub thresholds: MatchThresholds,
    pub recompute: RecomputeConfig,
}

/// Template reused when the session started.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTemplate {
    pub fingerprint: String,
    pub kind: TemplateMatchKind,
    pub score: f64,
    /// Headers the template assigned.
    pub assigned: usize,
}

/// Outcome of a bulk accept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptAllOutcome {
    pub accepted: Vec<MappingAssignment>,
    /// Suggestions that lost to an earlier one targeting the same field.
    pub conflicts: Vec<MappingError>,
}

#[derive(Debug, Clone)]
pub struct ImportSession {
    file_id: Option<String>,
    identity: FileIdentity,
    headers: Vec<String>,
    /// Session copy of the catalog; custom fields are added here.
    catalog: FieldCatalog,
    validator: MinimumSetValidator,
    options: SessionOptions,
    store: MappingStore,
    dismissals: DismissalTracker,
    validation: ValidationResult,
    suggestions: SuggestionSet,
    scheduler: RecomputeScheduler,
    template: Option<AppliedTemplate>,
}

impl ImportSession {
    /// Start a session for a freshly acquired header list.
    ///
    /// Loads the dismissals stored for the file identity, then seeds the
    /// default table, applies `template` if given and finally the eager
    /// auto-matches.
    pub fn start(
        acquired: AcquiredHeaders,
        catalog: FieldCatalog,
        mut dismissals: DismissalTracker,
        options: SessionOptions,
        template: Option<&TemplateMatch>,
    ) -> Self {
        let AcquiredHeaders { file_id, headers } = acquired;
        let identity = FileIdentity::resolve(file_id.as_deref(), &headers);
        dismissals.swap_file_context(identity.clone());

        let mut store = MappingStore::new();
        let defaults = store.seed_defaults(&headers);
        let template = template.map(|found| {
            let applied = store.apply_template(&headers, &found.template, &catalog);
            AppliedTemplate {
                fingerprint: found.template.fingerprint.clone(),
                kind: found.kind,
                score: found.score,
                assigned: applied.len(),
            }
        });
        let auto = store.apply_auto_matches(&headers, &catalog);

        info!(
            identity = %identity,
            headers = headers.len(),
            defaults = defaults.len(),
            template = template.as_ref().map_or(0, |t| t.assigned),
            auto = auto.len(),
            "import session started"
        );

        let validator = MinimumSetValidator::new(&catalog);
        let mut session = Self {
            file_id,
            identity,
            headers,
            catalog,
            validator,
            options,
            store,
            dismissals,
            validation: ValidationResult::default(),
            suggestions: SuggestionSet::default(),
            scheduler: RecomputeScheduler::new(),
            template,
        };
        session.revalidate();
        session.refresh_suggestions();
        session
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn mapping(&self) -> &MappingStore {
        &self.store
    }

    pub fn dismissals(&self) -> &DismissalTracker {
        &self.dismissals
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn template(&self) -> Option<&AppliedTemplate> {
        self.template.as_ref()
    }

    /// Validation of the current mapping. Always up to date.
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// Last computed suggestions; may lag behind the mapping until the
    /// next [`poll_suggestions`](Self::poll_suggestions).
    pub fn suggestions(&self) -> &SuggestionSet {
        &self.suggestions
    }

    pub fn suggestions_stale(&self) -> bool {
        self.scheduler.is_dirty()
    }

    /// Headers with no field assigned, in file order.
    pub fn unmapped_headers(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .filter(|h| !self.store.is_assigned(h))
            .map(String::as_str)
    }

    /// Rebuild suggestions if the coalescing window has passed.
    pub fn poll_suggestions(&mut self) -> bool {
        if !self.scheduler.is_due(&self.options.recompute) {
            return false;
        }
        self.refresh_suggestions();
        true
    }

    /// Rebuild suggestions now.
    pub fn refresh_suggestions(&mut self) -> &SuggestionSet {
        self.suggestions = self
            .generator()
            .generate(&self.headers, &self.store, &self.dismissals);
        self.scheduler.recomputed();
        &self.suggestions
    }

    /// Accept the current suggestion for one header.
    ///
    /// Only pending suggestions (at or above `pending_min`) are one-click.
    ///
    /// The suggestion is recomputed against the live mapping, so a stale
    /// cache never leads to a conflicting accept.
    pub fn accept_suggestion(&mut self, header: &str) -> Result<MappingAssignment> {
        self.ensure_header(header)?;
        if self.store.is_assigned(header) || self.dismissals.is_dismissed(header) {
            return Err(MappingError::NoSuggestion(header.to_string()).into());
        }
        let suggestion = self.generator().suggest(header, &self.store);
        let assignment = self.accept(suggestion)?;
        self.changed();
        Ok(assignment)
    }

    /// Dismiss a header without mapping it.
    pub fn reject_suggestion(&mut self, header: &str) -> Result<()> {
        self.ensure_header(header)?;
        self.dismissals.dismiss(header);
        debug!(header, "suggestion rejected");
        self.changed();
        Ok(())
    }

    /// Dismiss every header with a pending suggestion. Returns the headers.
    pub fn reject_all(&mut self) -> Vec<String> {
        let rejected: Vec<String> = self
            .generator()
            .generate(&self.headers, &self.store, &self.dismissals)
            .pending()
            .map(|s| s.header.clone())
            .collect();
        for header in &rejected {
            self.dismissals.dismiss(header);
        }
        info!(rejected = rejected.len(), "rejected suggestions");
        if !rejected.is_empty() {
            self.changed();
        }
        rejected
    }

    /// Accept every surfaced suggestion at or above `accept_all_min`.
    ///
    /// Headers the default table marks do-not-map are left for the operator.
    /// Conflicts between suggestions are reported, not resolved.
    pub fn accept_all(&mut self) -> AcceptAllOutcome {
        let candidates: Vec<Suggestion> = self
            .generator()
            .generate(&self.headers, &self.store, &self.dismissals)
            .accept_all_candidates()
            .filter(|s| !self.store.is_do_not_map(&s.header))
            .cloned()
            .collect();

        let mut outcome = AcceptAllOutcome::default();
        for suggestion in candidates {
            match self.accept(suggestion) {
                Ok(assignment) => outcome.accepted.push(assignment),
                Err(err) => {
                    warn!(error = %err, "suggestion not accepted");
                    outcome.conflicts.push(err);
                }
            }
        }
        info!(
            accepted = outcome.accepted.len(),
            conflicts = outcome.conflicts.len(),
            "accepted suggestions"
        );
        if !outcome.accepted.is_empty() {
            self.changed();
        }
        outcome
    }

    /// Manual assignment. Also dismisses the header.
    pub fn assign(&mut self, header: &str, field_key: &str) -> Result<MappingAssignment> {
        self.ensure_header(header)?;
        if !self.catalog.contains(field_key) {
            return Err(MappingError::UnknownField(field_key.to_string()).into());
        }
        let assignment = self.store.assign(header, field_key)?.clone();
        self.dismissals.dismiss(header);
        self.changed();
        Ok(assignment)
    }

    /// Remove a header's assignment and make it eligible for suggestions again.
    pub fn clear(&mut self, header: &str) -> Result<Option<MappingAssignment>> {
        self.ensure_header(header)?;
        let removed = self.store.clear(header, &mut self.dismissals);
        self.changed();
        Ok(removed)
    }

    /// Register a custom target field for this session.
    pub fn add_custom_field(&mut self, label: &str) -> Result<FieldDefinition> {
        let field = self.catalog.add_custom(label)?.clone();
        debug!(field = %field.key, label, "custom field added");
        self.changed();
        Ok(field)
    }

    /// Apply a template to the headers that are still unassigned.
    pub fn apply_template(&mut self, found: &TemplateMatch) -> Vec<MappingAssignment> {
        let applied = self
            .store
            .apply_template(&self.headers, &found.template, &self.catalog);
        if !applied.is_empty() {
            self.changed();
        }
        applied
    }

    /// Catalog fields ordered for the manual picker.
    pub fn rank_fields(&self, header: &str) -> Vec<RankedField> {
        rank_fields(&self.catalog, header)
    }

    /// Freeze the current mapping.
    pub fn snapshot(&self) -> MappingResult {
        self.store.snapshot(&self.headers, &self.catalog)
    }

    /// End the session, keeping only the dismissal memory.
    pub fn into_dismissals(self) -> DismissalTracker {
        self.dismissals
    }

    fn generator(&self) -> SuggestionGenerator<'_> {
        SuggestionGenerator::new(&self.catalog, self.options.thresholds)
    }

    fn ensure_header(&self, header: &str) -> Result<()> {
        if self.headers.iter().any(|h| h == header) {
            Ok(())
        } else {
            Err(MappingError::UnknownHeader(header.to_string()).into())
        }
    }

    fn accept(&mut self, suggestion: Suggestion) -> tabmap_map::Result<MappingAssignment> {
        let Suggestion {
            header,
            candidate_field,
            confidence,
            tier,
            rationale,
            ..
        } = suggestion;
        let field_key = match candidate_field {
            Some(key) if tier != MatchTier::Weak => key,
            _ => return Err(MappingError::NotActionable { header, confidence }),
        };
        // Below `pending_min` the operator picks the field by hand.
        if confidence < self.options.thresholds.pending_min {
            return Err(MappingError::NotActionable { header, confidence });
        }

        let assignment = self
            .store
            .assign_with(MappingAssignment {
                header,
                field_key,
                origin: AssignmentOrigin::AcceptedSuggestion,
                confidence,
                rationale,
            })?
            .clone();
        self.dismissals.dismiss(&assignment.header);
        Ok(assignment)
    }

    fn changed(&mut self) {
        self.revalidate();
        self.scheduler.mark_dirty();
    }

    fn revalidate(&mut self) {
        self.validation = self.validator.validate(&self.store, self.headers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(headers: &[&str]) -> ImportSession {
        session_with(headers, MatchThresholds::default())
    }

    fn session_with(headers: &[&str], thresholds: MatchThresholds) -> ImportSession {
        let acquired = AcquiredHeaders::new(
            Some("upload-1".to_string()),
            headers.iter().map(|h| (*h).to_string()).collect(),
        );
        ImportSession::start(
            acquired,
            FieldCatalog::embedded().unwrap(),
            DismissalTracker::new(),
            SessionOptions {
                thresholds,
                recompute: RecomputeConfig::immediate(),
            },
            None,
        )
    }

    #[test]
    fn start_seeds_defaults_and_auto_matches() {
        let s = session(&["playerId", "session_date", "Top Speed (km/h)"]);
        assert_eq!(s.mapping().field_for("playerId"), Some("playerId"));
        assert_eq!(
            s.mapping().get("playerId").unwrap().origin,
            AssignmentOrigin::Default
        );
        assert!(s.validation().is_valid);
        assert_eq!(s.identity(), &FileIdentity::FileId("upload-1".to_string()));
    }

    #[test]
    fn accepting_a_suggestion_dismisses_the_header() {
        let mut s = session(&["Dist_Total"]);
        let assignment = s.accept_suggestion("Dist_Total").unwrap();
        assert_eq!(assignment.field_key, "total_distance_m");
        assert_eq!(assignment.origin, AssignmentOrigin::AcceptedSuggestion);
        assert!(s.dismissals().is_dismissed("Dist_Total"));

        assert!(s.suggestions_stale());
        assert!(s.poll_suggestions());
        assert!(s.suggestions().get("Dist_Total").is_none());
    }

    #[test]
    fn weak_suggestion_cannot_be_accepted() {
        let mut s = session(&["Zzz Qqq"]);
        let err = s.accept_suggestion("Zzz Qqq").unwrap_err();
        assert!(matches!(
            err,
            crate::WizardError::Mapping(MappingError::NotActionable { confidence: 50, .. })
        ));
        assert!(s.mapping().is_empty());
    }

    #[test]
    fn unknown_header_and_field_are_rejected() {
        let mut s = session(&["Km"]);
        assert!(s.assign("Nope", "total_distance_m").is_err());
        assert!(matches!(
            s.assign("Km", "not_a_field"),
            Err(crate::WizardError::Mapping(MappingError::UnknownField(_)))
        ));
    }

    #[test]
    fn custom_field_becomes_assignable() {
        let mut s = session(&["Wellness Score"]);
        let field = s.add_custom_field("Wellness Score").unwrap();
        assert_eq!(field.key, "custom.wellness_score");
        s.assign("Wellness Score", &field.key).unwrap();
        assert_eq!(
            s.snapshot().field_map().get("Wellness Score").map(String::as_str),
            Some("custom.wellness_score")
        );
    }

    #[test]
    fn clear_reinstates_header() {
        let mut s = session(&["Km"]);
        s.assign("Km", "total_distance_m").unwrap();
        assert!(s.dismissals().is_dismissed("Km"));
        let removed = s.clear("Km").unwrap();
        assert_eq!(removed.unwrap().field_key, "total_distance_m");
        assert!(!s.dismissals().is_dismissed("Km"));
        assert_eq!(s.unmapped_headers().collect::<Vec<_>>(), vec!["Km"]);
    }

    #[test]
    fn surfaced_but_not_pending_needs_manual_assign() {
        let thresholds = MatchThresholds {
            surface_min: 60,
            pending_min: 95,
            accept_all_min: 95,
        };
        let mut s = session_with(&["Dist_Total"], thresholds);
        let suggestion = s.suggestions().get("Dist_Total").unwrap();
        assert_eq!(suggestion.confidence, 90);
        assert_eq!(s.suggestions().pending().count(), 0);

        let err = s.accept_suggestion("Dist_Total").unwrap_err();
        assert!(matches!(
            err,
            crate::WizardError::Mapping(MappingError::NotActionable { confidence: 90, .. })
        ));
        assert!(s.mapping().is_empty());
        assert!(!s.dismissals().is_dismissed("Dist_Total"));

        s.assign("Dist_Total", "total_distance_m").unwrap();
        assert_eq!(s.mapping().field_for("Dist_Total"), Some("total_distance_m"));
    }

    #[test]
    fn pending_suggestion_is_one_click() {
        let thresholds = MatchThresholds {
            surface_min: 60,
            pending_min: 90,
            accept_all_min: 95,
        };
        let mut s = session_with(&["Dist_Total"], thresholds);
        assert_eq!(s.suggestions().pending().count(), 1);
        let assignment = s.accept_suggestion("Dist_Total").unwrap();
        assert_eq!(assignment.confidence, 90);
    }

    #[test]
    fn accept_all_leaves_do_not_map_headers_alone() {
        let mut s = session(&["playerId", "session_date", "duration_minutes"]);
        assert!(s.mapping().is_do_not_map("duration_minutes"));
        assert!(s.suggestions().get("duration_minutes").is_some());

        let outcome = s.accept_all();
        assert!(outcome.accepted.is_empty());
        assert!(!s.mapping().is_assigned("duration_minutes"));

        s.assign("duration_minutes", "duration_minutes").unwrap();
        assert!(s.mapping().is_assigned("duration_minutes"));
    }

    #[test]
    fn reject_all_dismisses_pending_headers_only() {
        let mut s = session(&["Dist_Total", "Player Name", "Zzz Qqq"]);
        let rejected = s.reject_all();
        assert_eq!(rejected, vec!["Dist_Total", "Player Name"]);
        assert!(s.dismissals().is_dismissed("Dist_Total"));
        assert!(!s.dismissals().is_dismissed("Zzz Qqq"));
        assert!(s.mapping().is_empty());

        let refreshed = s.refresh_suggestions();
        assert!(refreshed.surfaced.is_empty());
        assert!(refreshed.get("Zzz Qqq").is_some());
    }

    #[test]
    fn rank_fields_includes_custom_fields() {
        let mut s = session(&["Wellness Score"]);
        s.add_custom_field("Wellness Score").unwrap();
        let ranked = s.rank_fields("Wellness Score");
        assert_eq!(ranked[0].key, "custom.wellness_score");
        assert_eq!(ranked.len(), s.catalog().len());
    }
}
