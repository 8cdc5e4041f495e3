use std::io::Write;

use tabmap_catalog::{CatalogError, FieldCatalog};

#[test]
fn embedded_catalog_requires_player_and_date() {
    let catalog = FieldCatalog::embedded().expect("embedded catalog");
    let required: Vec<&str> = catalog.required_keys().collect();
    assert_eq!(required, vec!["playerId", "session_date"]);
    assert_eq!(catalog.keys().next(), Some("playerId"));
}

#[test]
fn embedded_catalog_covers_performance_metrics() {
    let catalog = FieldCatalog::embedded().expect("embedded catalog");
    for key in [
        "total_distance_m",
        "sprint_distance_m",
        "top_speed_kmh",
        "avg_speed_kmh",
        "avg_heart_rate",
        "max_heart_rate",
        "duration_minutes",
        "player_load",
        "high_intensity_runs",
        "equivalent_distance_m",
        "avg_metabolic_power_wkg",
        "num_acc_over_3_ms2",
        "num_dec_over_minus3_ms2",
        "session_type",
        "drill_name",
        "notes",
    ] {
        assert!(catalog.contains(key), "missing {key}");
    }
    let distance = catalog.get("total_distance_m").unwrap();
    assert_eq!(distance.category, "Performance");
    assert!(!distance.example.is_empty());
}

#[test]
fn override_file_replaces_embedded_catalog() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "key,label,required,category,example,description").unwrap();
    writeln!(file, "athlete,Athlete,yes,Identification,Jane,Athlete name").unwrap();
    writeln!(file, "km,Kilometres,no,Performance,8.4,").unwrap();

    let catalog = FieldCatalog::load(file.path()).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.required_keys().collect::<Vec<_>>(), vec!["athlete"]);
}

#[test]
fn missing_override_reports_path() {
    let err = FieldCatalog::load(std::path::Path::new("/nonexistent/fields.csv")).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/fields.csv"));
}

#[test]
fn header_only_catalog_is_empty_error() {
    let err = FieldCatalog::from_csv_str("key,label,required,category\n", "blank.csv").unwrap_err();
    assert!(matches!(err, CatalogError::Empty(_)));
}
