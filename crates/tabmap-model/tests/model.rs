use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;
use tabmap_model::{
    AcquiredHeaders, AssignmentOrigin, CommitResponse, CommitSummary, FileIdentity, MappedField,
    MappingResult, MatchTier, PreviewResponse, RowError, Suggestion,
};

fn suggestion(tier: MatchTier, candidate: Option<&str>, confidence: u8) -> Suggestion {
    Suggestion {
        header: "Dist_Total".to_string(),
        candidate_field: candidate.map(str::to_string),
        confidence,
        tier,
        rationale: "test".to_string(),
        example: String::new(),
        category: String::new(),
        alternatives: Vec::new(),
    }
}

#[test]
fn weak_suggestions_are_never_actionable() {
    assert!(suggestion(MatchTier::Pattern, Some("total_distance_m"), 90).is_actionable());
    assert!(!suggestion(MatchTier::Weak, Some("total_distance_m"), 50).is_actionable());
    assert!(!suggestion(MatchTier::Weak, None, 50).is_actionable());
}

#[test]
fn tier_ordering_follows_precedence() {
    let mut tiers = vec![
        MatchTier::Weak,
        MatchTier::Pattern,
        MatchTier::Exact,
        MatchTier::Similar,
    ];
    tiers.sort();
    assert_eq!(
        tiers,
        vec![
            MatchTier::Exact,
            MatchTier::Similar,
            MatchTier::Pattern,
            MatchTier::Weak
        ]
    );
}

#[test]
fn origin_serializes_screaming_snake_case() {
    let value = serde_json::to_value(AssignmentOrigin::AcceptedSuggestion).unwrap();
    assert_eq!(value, json!("ACCEPTED_SUGGESTION"));
    assert_eq!(AssignmentOrigin::AutoPattern.to_string(), "AUTO_PATTERN");
    assert!(AssignmentOrigin::AutoSimilar.is_automatic());
    assert!(!AssignmentOrigin::Manual.is_automatic());
}

#[test]
fn mapping_result_exposes_plain_field_map() {
    let mut mapping = BTreeMap::new();
    mapping.insert(
        "Player".to_string(),
        MappedField {
            field_key: "playerId".to_string(),
            confidence: 100,
            rationale: "Default mapping".to_string(),
            origin: AssignmentOrigin::Default,
        },
    );
    let result = MappingResult {
        mapping,
        statistics: Default::default(),
    };
    assert_eq!(result.field_map()["Player"], "playerId");
    assert_eq!(result.header_for("playerId"), Some("Player"));
    assert_eq!(result.header_for("session_date"), None);
}

#[test]
fn identity_works_as_json_map_key() {
    let headers = vec!["Date".to_string(), "Player".to_string()];
    let mut saved: BTreeMap<FileIdentity, BTreeSet<String>> = BTreeMap::new();
    saved.insert(
        FileIdentity::structural(&headers),
        BTreeSet::from(["player".to_string()]),
    );
    saved.insert(
        FileIdentity::FileId("upload-7".to_string()),
        BTreeSet::new(),
    );

    let text = serde_json::to_string(&saved).unwrap();
    let restored: BTreeMap<FileIdentity, BTreeSet<String>> = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, saved);
}

#[test]
fn acquired_headers_tolerate_missing_file_id() {
    let parsed: AcquiredHeaders = serde_json::from_value(json!({ "headers": ["A", "B"] })).unwrap();
    assert_eq!(parsed.file_id, None);
    assert_eq!(parsed.headers.len(), 2);
}

#[test]
fn preview_defaults_missing_sections() {
    let parsed: PreviewResponse = serde_json::from_value(json!({ "rows": [] })).unwrap();
    assert!(parsed.warnings.is_empty());
    assert_eq!(parsed.statistics.success_rate(), 0.0);
}

#[test]
fn commit_response_wire_shape() {
    let response = CommitResponse {
        summary: CommitSummary {
            total_processed: 3,
            successful_imports: 2,
            errors: 1,
            players_affected: 2,
            date_range: Some("2024-03-01..2024-03-02".to_string()),
        },
        errors: vec![RowError {
            row_index: 2,
            message: "missing playerId".to_string(),
        }],
    };
    assert!(response.summary.is_partial());

    insta::assert_json_snapshot!(response, @r#"
    {
      "summary": {
        "totalProcessed": 3,
        "successfulImports": 2,
        "errors": 1,
        "playersAffected": 2,
        "dateRange": "2024-03-01..2024-03-02"
      },
      "errors": [
        {
          "rowIndex": 2,
          "message": "missing playerId"
        }
      ]
    }
    "#);
}
