use tabmap_catalog::FieldCatalog;
use tabmap_map::{
    DismissalTracker, MappingError, MappingStore, MatchThresholds, MinimumSetValidator,
    SuggestionGenerator, TemplateMatchKind, TemplateRepository,
};
use tabmap_model::{AssignmentOrigin, FileIdentity, MappingAssignment, MatchTier};

fn headers(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[test]
fn vendor_export_reaches_valid_mapping_after_accepting_confident_suggestions() {
    let catalog = FieldCatalog::embedded().unwrap();
    let cols = headers(&["Player Name", "Match Date", "Minutes", "Dist_Total"]);
    let mut store = MappingStore::new();
    let mut dismissals = DismissalTracker::new();
    dismissals.swap_file_context(FileIdentity::structural(&cols));

    store.seed_defaults(&cols);
    let auto = store.apply_auto_matches(&cols, &catalog);
    assert!(auto.is_empty(), "no header is an exact or alias hit: {auto:?}");

    let validator = MinimumSetValidator::new(&catalog);
    assert!(!validator.validate(&store, cols.len()).is_valid);

    let generator = SuggestionGenerator::new(&catalog, MatchThresholds::default());
    let set = generator.generate(&cols, &store, &dismissals);

    let dist = set.get("Dist_Total").unwrap();
    assert_eq!(dist.tier, MatchTier::Pattern);
    assert_eq!(dist.candidate_field.as_deref(), Some("total_distance_m"));
    assert!(dist.rationale.to_lowercase().contains("distance"));

    let accepted: Vec<_> = set.accept_all_candidates().cloned().collect();
    assert_eq!(accepted.len(), 4);
    for suggestion in accepted {
        store
            .assign_with(MappingAssignment {
                header: suggestion.header.clone(),
                field_key: suggestion.candidate_field.clone().unwrap(),
                origin: AssignmentOrigin::AcceptedSuggestion,
                confidence: suggestion.confidence,
                rationale: suggestion.rationale.clone(),
            })
            .unwrap();
        dismissals.dismiss(&suggestion.header);
    }

    let result = validator.validate(&store, cols.len());
    assert!(result.is_valid, "missing {:?}", result.missing_required_fields);
    assert_eq!(store.field_for("Match Date"), Some("session_date"));
    assert!(generator.generate(&cols, &store, &dismissals).is_empty());
}

#[test]
fn conflicting_assignment_reports_holder() {
    let mut store = MappingStore::new();
    store.assign("A", "total_distance_m").unwrap();
    let err = store.assign("B", "total_distance_m").unwrap_err();
    assert_eq!(err.field(), Some("total_distance_m"));
    assert_eq!(err.header(), Some("A"));
    assert!(matches!(err, MappingError::Conflict { .. }));
    assert_eq!(store.field_for("A"), Some("total_distance_m"));
}

#[test]
fn clearing_a_mapping_reinstates_suggestions() {
    let catalog = FieldCatalog::embedded().unwrap();
    let cols = headers(&["Dist_Total"]);
    let mut store = MappingStore::new();
    let mut dismissals = DismissalTracker::new();
    dismissals.swap_file_context(FileIdentity::FileId("upload-1".to_string()));

    store.assign("Dist_Total", "total_distance_m").unwrap();
    dismissals.dismiss("Dist_Total");
    let generator = SuggestionGenerator::new(&catalog, MatchThresholds::default());
    assert!(generator.generate(&cols, &store, &dismissals).is_empty());

    store.clear("Dist_Total", &mut dismissals);
    assert!(!dismissals.is_dismissed("Dist_Total"));
    let set = generator.generate(&cols, &store, &dismissals);
    assert_eq!(set.surfaced.len(), 1);
}

#[test]
fn rejected_header_stays_dismissed_across_file_switches() {
    let catalog = FieldCatalog::embedded().unwrap();
    let file_a = headers(&["Max Speed", "Player"]);
    let file_b = headers(&["Athlete", "Date"]);
    let mut dismissals = DismissalTracker::new();
    let generator = SuggestionGenerator::new(&catalog, MatchThresholds::default());

    dismissals.swap_file_context(FileIdentity::structural(&file_a));
    dismissals.dismiss("Max Speed");
    dismissals.swap_file_context(FileIdentity::structural(&file_b));
    dismissals.swap_file_context(FileIdentity::structural(&file_a));

    let set = generator.generate(&file_a, &MappingStore::new(), &dismissals);
    assert!(set.get("Max Speed").is_none());
    assert!(set.get("Player").is_some());
}

#[test]
fn learned_template_is_reused_for_similar_layout() {
    let dir = tempfile::tempdir().unwrap();
    let repo = TemplateRepository::new(dir.path()).unwrap();
    let catalog = FieldCatalog::embedded().unwrap();

    let learned = headers(&["Athlete", "Day", "Km", "Vmax", "Bpm"]);
    let mut store = MappingStore::new();
    store.assign("Athlete", "playerId").unwrap();
    store.assign("Day", "session_date").unwrap();
    store.assign("Km", "total_distance_m").unwrap();
    store.assign("Vmax", "top_speed_kmh").unwrap();
    repo.save(&learned, &store.field_map(), Default::default())
        .unwrap();

    let exact = repo.find(&learned, 0.7).unwrap().unwrap();
    assert_eq!(exact.kind, TemplateMatchKind::Exact);

    // 5 shared of 6 distinct headers
    let next = headers(&["athlete", "DAY", "km", "vmax", "bpm", "Notes"]);
    let fuzzy = repo.find(&next, 0.7).unwrap().unwrap();
    assert_eq!(fuzzy.kind, TemplateMatchKind::Fuzzy);
    assert!((fuzzy.score - 5.0 / 6.0).abs() < 1e-9);

    let mut fresh = MappingStore::new();
    let applied = fresh.apply_template(&next, &fuzzy.template, &catalog);
    assert_eq!(applied.len(), 4);
    assert_eq!(fresh.field_for("DAY"), Some("session_date"));
    assert_eq!(
        fresh.get("athlete").unwrap().origin,
        AssignmentOrigin::Template
    );

    assert!(repo.find(&headers(&["Other", "Layout"]), 0.7).unwrap().is_none());
}

#[test]
fn deleted_template_is_no_longer_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo = TemplateRepository::new(dir.path()).unwrap();
    let layout = headers(&["Athlete", "Day"]);
    let mut store = MappingStore::new();
    store.assign("Athlete", "playerId").unwrap();
    let saved = repo
        .save(&layout, &store.field_map(), Default::default())
        .unwrap();

    assert!(repo.delete(&saved.fingerprint).unwrap());
    assert!(!repo.delete(&saved.fingerprint).unwrap());
    assert!(repo.list().unwrap().is_empty());
    assert!(repo.find(&layout, 0.7).unwrap().is_none());
}

#[test]
fn delete_ignores_names_outside_the_template_dir() {
    let dir = tempfile::tempdir().unwrap();
    let repo = TemplateRepository::new(dir.path().join("templates")).unwrap();
    let outside = dir.path().join("keep.json");
    std::fs::write(&outside, "{}").unwrap();

    assert!(!repo.delete("../keep").unwrap());
    assert!(!repo.delete("").unwrap());
    assert!(outside.exists());
}
