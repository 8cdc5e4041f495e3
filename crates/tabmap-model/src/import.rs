//! Request and response shapes exchanged with the header acquisition,
//! transform and commit services.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One materialized output row, keyed by target field.
pub type Record = BTreeMap<String, serde_json::Value>;

/// Header list returned by the acquisition service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquiredHeaders {
    #[serde(default)]
    pub file_id: Option<String>,
    pub headers: Vec<String>,
}

impl AcquiredHeaders {
    pub fn new(file_id: Option<String>, headers: Vec<String>) -> Self {
        Self { file_id, headers }
    }
}

/// Source format passed through to the transform service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    #[default]
    Auto,
    Csv,
    Excel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    pub file_id: Option<String>,
    /// Header to field key.
    pub mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub format_hint: FormatHint,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewStatistics {
    pub total_rows: usize,
    pub success_rows: usize,
    pub error_rows: usize,
}

impl PreviewStatistics {
    /// Percentage of rows that transformed cleanly, 0 for an empty file.
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.success_rows as f64 * 100.0 / self.total_rows as f64
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub rows: Vec<Record>,
    #[serde(default)]
    pub statistics: PreviewStatistics,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub total_processed: usize,
    pub successful_imports: usize,
    pub errors: usize,
    pub players_affected: usize,
    #[serde(default)]
    pub date_range: Option<String>,
}

impl CommitSummary {
    pub fn is_partial(&self) -> bool {
        self.errors > 0 && self.successful_imports > 0
    }

    /// Percentage of processed rows that were imported.
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        self.successful_imports as f64 * 100.0 / self.total_processed as f64
    }
}

/// Per-row rejection reported by the commit service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_index: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub summary: CommitSummary,
    #[serde(default)]
    pub errors: Vec<RowError>,
}
