//! Caps on how much of a preview or commit result is shown at once.
//!
//! The full lists stay on the response values; these helpers only decide
//! what an operator sees first.

use serde::{Deserialize, Serialize};
use tabmap_model::{PreviewResponse, Record, RowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayCaps {
    /// Transformed rows shown in the preview.
    pub preview_rows: usize,
    /// Per-row commit errors listed before the rest are summarised.
    pub commit_errors: usize,
}

impl Default for DisplayCaps {
    fn default() -> Self {
        Self {
            preview_rows: 20,
            commit_errors: 5,
        }
    }
}

impl DisplayCaps {
    pub fn preview_rows<'a>(&self, preview: &'a PreviewResponse) -> &'a [Record] {
        let shown = preview.rows.len().min(self.preview_rows);
        &preview.rows[..shown]
    }

    pub fn hidden_preview_rows(&self, preview: &PreviewResponse) -> usize {
        preview.rows.len().saturating_sub(self.preview_rows)
    }

    /// One line per shown error, then `... and N more` when some are cut.
    pub fn commit_error_lines(&self, errors: &[RowError]) -> Vec<String> {
        let mut lines: Vec<String> = errors
            .iter()
            .take(self.commit_errors)
            .map(|e| format!("Row {}: {}", e.row_index, e.message))
            .collect();
        let hidden = errors.len().saturating_sub(self.commit_errors);
        if hidden > 0 {
            lines.push(format!("... and {hidden} more"));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_errors(count: usize) -> Vec<RowError> {
        (1..=count)
            .map(|i| RowError {
                row_index: i,
                message: "missing playerId".to_string(),
            })
            .collect()
    }

    #[test]
    fn commit_errors_beyond_cap_are_summarised() {
        let lines = DisplayCaps::default().commit_error_lines(&row_errors(8));
        insta::assert_snapshot!(lines.join("\n"), @r"
        Row 1: missing playerId
        Row 2: missing playerId
        Row 3: missing playerId
        Row 4: missing playerId
        Row 5: missing playerId
        ... and 3 more
        ");
    }

    #[test]
    fn short_error_list_is_shown_whole() {
        let lines = DisplayCaps::default().commit_error_lines(&row_errors(2));
        assert_eq!(lines.len(), 2);
        assert!(DisplayCaps::default().commit_error_lines(&[]).is_empty());
    }

    #[test]
    fn preview_rows_are_capped() {
        let caps = DisplayCaps {
            preview_rows: 2,
            ..DisplayCaps::default()
        };
        let preview = PreviewResponse {
            rows: vec![Record::new(); 5],
            ..PreviewResponse::default()
        };
        assert_eq!(caps.preview_rows(&preview).len(), 2);
        assert_eq!(caps.hidden_preview_rows(&preview), 3);
    }
}
