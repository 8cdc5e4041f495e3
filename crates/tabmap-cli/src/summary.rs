//! Terminal rendering of catalog, mapping, suggestions and import results.

use std::collections::BTreeSet;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde_json::Value;
use tabmap_catalog::FieldCatalog;
use tabmap_map::{MappingStore, MappingTemplate, RankedField, SuggestionSet};
use tabmap_model::{
    AssignmentOrigin, CommitResponse, MatchTier, PreviewResponse, Suggestion, ValidationResult,
};
use tabmap_wizard::{DisplayCaps, ImportSession};

pub fn fields_table(catalog: &FieldCatalog) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Category"),
        header_cell("Required"),
        header_cell("Example"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    for field in catalog.iter() {
        table.add_row(vec![
            Cell::new(&field.key).fg(Color::Blue),
            Cell::new(&field.label),
            Cell::new(&field.category),
            if field.required {
                Cell::new("yes").fg(Color::Yellow).add_attribute(Attribute::Bold)
            } else {
                dim_cell("-")
            },
            example_cell(&field.example),
        ]);
    }
    table
}

/// Current assignments in file order, unmapped headers included.
pub fn mapping_table(session: &ImportSession) -> Table {
    let store = session.mapping();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Field"),
        header_cell("Origin"),
        header_cell("Confidence"),
        header_cell("Rationale"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for header in session.headers() {
        match store.get(header) {
            Some(assignment) => table.add_row(vec![
                Cell::new(header),
                Cell::new(&assignment.field_key).fg(Color::Blue),
                origin_cell(assignment.origin),
                confidence_cell(assignment.confidence),
                Cell::new(&assignment.rationale),
            ]),
            None => table.add_row(vec![
                Cell::new(header),
                unmapped_cell(store, header),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
            ]),
        };
    }
    table
}

pub fn suggestions_table(set: &SuggestionSet) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Suggested field"),
        header_cell("Tier"),
        header_cell("Confidence"),
        header_cell("Rationale"),
        header_cell("Alternatives"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    let accept_all_min = set.thresholds().accept_all_min;
    for suggestion in set.surfaced.iter().chain(set.unrecognized.iter()) {
        table.add_row(vec![
            Cell::new(&suggestion.header),
            candidate_cell(suggestion),
            tier_cell(suggestion.tier),
            if suggestion.confidence >= accept_all_min && suggestion.is_actionable() {
                Cell::new(format!("{}%", suggestion.confidence))
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold)
            } else {
                confidence_cell(suggestion.confidence)
            },
            Cell::new(&suggestion.rationale),
            alternatives_cell(suggestion),
        ]);
    }
    table
}

/// Best `limit` catalog fields for one column, for picking by hand.
pub fn ranked_fields_table(ranked: &[RankedField], limit: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Category"),
        header_cell("Similarity"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for field in ranked.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&field.key).fg(Color::Blue),
            Cell::new(&field.label),
            Cell::new(&field.category),
            Cell::new(format!("{:.0}%", field.score * 100.0)),
        ]);
    }
    table
}

pub fn templates_table(templates: &[MappingTemplate]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Fingerprint"),
        header_cell("Saved"),
        header_cell("Columns"),
        header_cell("Mapped"),
        header_cell("Source"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for template in templates {
        table.add_row(vec![
            Cell::new(&template.fingerprint).fg(Color::Blue),
            Cell::new(&template.saved_at),
            Cell::new(template.headers_normalized.len()),
            Cell::new(template.mapping.len()),
            match template.meta.get("fileId") {
                Some(file) => Cell::new(file),
                None => dim_cell("-"),
            },
        ]);
    }
    table
}

/// First 12 characters of a template fingerprint.
pub fn short_fingerprint(fingerprint: &str) -> String {
    fingerprint.chars().take(12).collect()
}

/// Preview rows up to the display cap. Columns are the union of row keys.
pub fn preview_table(preview: &PreviewResponse, caps: &DisplayCaps) -> Table {
    let rows = caps.preview_rows(preview);
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    let mut table = Table::new();
    table.set_header(columns.iter().map(|c| header_cell(c)).collect::<Vec<_>>());
    apply_table_style(&mut table);
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|column| match row.get(*column) {
                    Some(value) => Cell::new(value_text(value)),
                    None => dim_cell("-"),
                })
                .collect::<Vec<_>>(),
        );
    }
    table
}

pub fn validation_lines(validation: &ValidationResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Mapped {} of {} columns",
        validation.total_mapped, validation.total_headers
    )];
    if validation.is_valid {
        lines.push("All required fields are mapped".to_string());
    } else {
        lines.push(format!(
            "Missing required fields: {}",
            validation.missing_required_fields.join(", ")
        ));
    }
    lines
}

pub fn preview_lines(preview: &PreviewResponse, caps: &DisplayCaps) -> Vec<String> {
    let stats = &preview.statistics;
    let mut lines = vec![format!(
        "Preview: {} rows, {} ok, {} with errors ({:.0}% success)",
        stats.total_rows,
        stats.success_rows,
        stats.error_rows,
        stats.success_rate()
    )];
    let hidden = caps.hidden_preview_rows(preview);
    if hidden > 0 {
        lines.push(format!(
            "Showing first {} rows, {hidden} more not shown",
            caps.preview_rows
        ));
    }
    lines.extend(preview.warnings.iter().map(|w| format!("warning: {w}")));
    lines
}

pub fn commit_lines(response: &CommitResponse, caps: &DisplayCaps) -> Vec<String> {
    let summary = &response.summary;
    let status = if summary.errors == 0 {
        "Import completed"
    } else if summary.successful_imports > 0 {
        "Import partially completed"
    } else {
        "Import failed"
    };
    let mut lines = vec![
        status.to_string(),
        format!("Rows processed: {}", summary.total_processed),
        format!("Rows imported: {}", summary.successful_imports),
        format!("Rows rejected: {}", summary.errors),
        format!("Players affected: {}", summary.players_affected),
        format!(
            "Date range: {}",
            summary.date_range.as_deref().unwrap_or("n/a")
        ),
    ];
    let errors = caps.commit_error_lines(&response.errors);
    if !errors.is_empty() {
        lines.push("Errors:".to_string());
        lines.extend(errors.into_iter().map(|line| format!("  {line}")));
    }
    lines
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn origin_cell(origin: AssignmentOrigin) -> Cell {
    let cell = Cell::new(origin.as_str());
    match origin {
        AssignmentOrigin::Manual | AssignmentOrigin::AcceptedSuggestion => cell.fg(Color::Green),
        AssignmentOrigin::Template => cell.fg(Color::Magenta),
        AssignmentOrigin::Default => cell.fg(Color::DarkGrey),
        _ => cell.fg(Color::Cyan),
    }
}

fn tier_cell(tier: MatchTier) -> Cell {
    let cell = Cell::new(tier.as_str());
    match tier {
        MatchTier::Exact | MatchTier::Similar => cell.fg(Color::Green),
        MatchTier::Pattern => cell.fg(Color::Yellow),
        MatchTier::Weak => cell.fg(Color::DarkGrey),
    }
}

fn confidence_cell(confidence: u8) -> Cell {
    Cell::new(format!("{confidence}%"))
}

fn candidate_cell(suggestion: &Suggestion) -> Cell {
    match &suggestion.candidate_field {
        Some(field) if suggestion.is_actionable() => Cell::new(field).fg(Color::Blue),
        _ => dim_cell("(unrecognized)"),
    }
}

fn alternatives_cell(suggestion: &Suggestion) -> Cell {
    if suggestion.alternatives.is_empty() {
        return dim_cell("-");
    }
    let keys: Vec<&str> = suggestion
        .alternatives
        .iter()
        .map(|a| a.field_key.as_str())
        .collect();
    Cell::new(keys.join(", "))
}

fn unmapped_cell(store: &MappingStore, header: &str) -> Cell {
    if store.is_do_not_map(header) {
        dim_cell("(do not map)")
    } else {
        Cell::new("(unmapped)").fg(Color::Yellow)
    }
}

fn example_cell(example: &str) -> Cell {
    if example.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(example)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabmap_model::{CommitSummary, RowError};

    #[test]
    fn commit_summary_caps_row_errors() {
        let response = CommitResponse {
            summary: CommitSummary {
                total_processed: 12,
                successful_imports: 5,
                errors: 7,
                players_affected: 3,
                date_range: Some("2024-08-01 to 2024-08-25".to_string()),
            },
            errors: (2..=8)
                .map(|row_index| RowError {
                    row_index,
                    message: "missing playerId".to_string(),
                })
                .collect(),
        };
        let lines = commit_lines(&response, &DisplayCaps::default());
        insta::assert_snapshot!(lines.join("\n"), @r"
        Import partially completed
        Rows processed: 12
        Rows imported: 5
        Rows rejected: 7
        Players affected: 3
        Date range: 2024-08-01 to 2024-08-25
        Errors:
          Row 2: missing playerId
          Row 3: missing playerId
          Row 4: missing playerId
          Row 5: missing playerId
          Row 6: missing playerId
          ... and 2 more
        ");
    }

    #[test]
    fn validation_names_missing_fields() {
        let validation = ValidationResult {
            is_valid: false,
            missing_required_fields: vec!["session_date".to_string()],
            total_mapped: 3,
            total_headers: 4,
        };
        assert_eq!(
            validation_lines(&validation),
            vec![
                "Mapped 3 of 4 columns".to_string(),
                "Missing required fields: session_date".to_string(),
            ]
        );
    }

    #[test]
    fn short_fingerprint_counts_characters() {
        assert_eq!(short_fingerprint("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_fingerprint(&"é".repeat(13)), "é".repeat(12));
        assert_eq!(short_fingerprint("abc"), "abc");
    }

    #[test]
    fn ranked_fields_table_respects_limit() {
        let catalog = FieldCatalog::embedded().unwrap();
        let ranked = tabmap_map::rank_fields(&catalog, "Top Spd");
        let mut table = ranked_fields_table(&ranked, 3);
        table.force_no_tty();
        assert_eq!(table.row_iter().count(), 3);
        assert!(table.to_string().contains("top_speed_kmh"));
    }

    #[test]
    fn fields_table_lists_every_field() {
        let catalog = FieldCatalog::embedded().unwrap();
        let mut table = fields_table(&catalog);
        table.force_no_tty();
        let rendered = table.to_string();
        assert!(rendered.contains("playerId"));
        assert!(rendered.contains("total_distance_m"));
        assert_eq!(table.row_iter().count(), catalog.len());
    }
}
