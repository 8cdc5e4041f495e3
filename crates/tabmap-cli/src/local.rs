//! File-based collaborators for running the wizard from the command line.
//!
//! - [`CsvHeaderSource`] reads the header row of a CSV file.
//! - [`LocalTransform`] projects rows through the mapping.
//! - [`JsonCommitter`] writes the projected rows to a JSON file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::{Map, Number, Value};
use tabmap_catalog::FieldCatalog;
use tabmap_model::{
    AcquiredHeaders, CUSTOM_PREFIX, CommitResponse, CommitSummary, PreviewResponse,
    PreviewStatistics, Record, RowError, TransformRequest, is_custom_field,
};
use tabmap_wizard::{CommitService, HeaderSource, TransformService, UpstreamError};
use tracing::{debug, info, trace};

use crate::logging::redact_value;

/// Object holding custom field values in each output row.
pub const EXTRAS_KEY: &str = "extras";

const PLAYER_FIELD: &str = "playerId";
const DATE_FIELD: &str = "session_date";

pub struct CsvHeaderSource {
    path: PathBuf,
}

impl CsvHeaderSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HeaderSource for CsvHeaderSource {
    fn acquire_headers(&self) -> Result<AcquiredHeaders, UpstreamError> {
        let (mut headers, _) = read_csv(&self.path, false).map_err(UpstreamError::acquire)?;
        headers.retain(|h| !h.is_empty());
        if headers.is_empty() {
            return Err(UpstreamError::no_headers(format!(
                "{} has no header row",
                self.path.display()
            )));
        }
        debug!(path = %self.path.display(), headers = headers.len(), "read headers");
        Ok(AcquiredHeaders::new(
            Some(self.path.display().to_string()),
            headers,
        ))
    }
}

/// Rows and row errors of one pass over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    pub rows: Vec<Record>,
    pub errors: Vec<RowError>,
    pub total_rows: usize,
    /// Mapped headers missing from the file.
    pub missing_columns: Vec<String>,
}

/// Applies a header → field mapping to every data row of a CSV file.
///
/// Standard fields become top-level keys, custom fields are nested under
/// [`EXTRAS_KEY`]. A row without a value for a required field is reported
/// as a row error and left out.
pub struct LocalTransform {
    path: PathBuf,
    required: Vec<String>,
}

impl LocalTransform {
    pub fn new(path: impl Into<PathBuf>, catalog: &FieldCatalog) -> Self {
        Self {
            path: path.into(),
            required: catalog.required_keys().map(str::to_string).collect(),
        }
    }

    pub fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, String> {
        let (headers, records) = read_csv(&self.path, true)?;
        let mut columns = Vec::new();
        let mut missing_columns = Vec::new();
        for (header, field) in &request.mapping {
            match headers.iter().position(|h| h == header) {
                Some(index) => columns.push((index, field.as_str())),
                None => missing_columns.push(header.clone()),
            }
        }

        let mut output = TransformOutput {
            total_rows: records.len(),
            missing_columns,
            ..TransformOutput::default()
        };
        for (i, record) in records.iter().enumerate() {
            // Line 1 is the header row.
            let row_index = i + 2;
            let row = project_row(record, &columns);
            let missing: Vec<&str> = self
                .required
                .iter()
                .map(String::as_str)
                .filter(|field| !row.contains_key(*field))
                .collect();
            if missing.is_empty() {
                trace!(row = row_index, player = %row_player(&row), "row transformed");
                output.rows.push(row);
            } else {
                output.errors.push(RowError {
                    row_index,
                    message: format!("missing {}", missing.join(", ")),
                });
            }
        }
        Ok(output)
    }
}

impl TransformService for LocalTransform {
    fn preview(&self, request: &TransformRequest) -> Result<PreviewResponse, UpstreamError> {
        let output = self.transform(request).map_err(UpstreamError::transform)?;
        let mut warnings: Vec<String> = output
            .missing_columns
            .iter()
            .map(|h| format!("Column '{h}' not found in file"))
            .collect();
        warnings.extend(
            output
                .errors
                .iter()
                .map(|e| format!("Row {}: {}", e.row_index, e.message)),
        );
        Ok(PreviewResponse {
            statistics: PreviewStatistics {
                total_rows: output.total_rows,
                success_rows: output.rows.len(),
                error_rows: output.errors.len(),
            },
            rows: output.rows,
            warnings,
        })
    }
}

/// Writes transformed rows as a JSON array.
pub struct JsonCommitter {
    transform: LocalTransform,
    output: PathBuf,
}

impl JsonCommitter {
    pub fn new(transform: LocalTransform, output: impl Into<PathBuf>) -> Self {
        Self {
            transform,
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl CommitService for JsonCommitter {
    fn commit(&self, request: &TransformRequest) -> Result<CommitResponse, UpstreamError> {
        let output = self
            .transform
            .transform(request)
            .map_err(UpstreamError::commit)?;
        let json = serde_json::to_string_pretty(&output.rows)
            .map_err(|e| UpstreamError::commit(e.to_string()))?;
        if let Some(parent) = self.output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                UpstreamError::commit(format!("{}: {e}", parent.display()))
            })?;
        }
        fs::write(&self.output, json)
            .map_err(|e| UpstreamError::commit(format!("{}: {e}", self.output.display())))?;

        let summary = CommitSummary {
            total_processed: output.total_rows,
            successful_imports: output.rows.len(),
            errors: output.errors.len(),
            players_affected: players_affected(&output.rows),
            date_range: date_range(&output.rows),
        };
        info!(
            path = %self.output.display(),
            rows = summary.successful_imports,
            errors = summary.errors,
            "wrote rows"
        );
        Ok(CommitResponse {
            summary,
            errors: output.errors,
        })
    }
}

/// Read a CSV file. Data rows are only collected when `with_rows` is set.
fn read_csv(path: &Path, with_rows: bool) -> Result<(Vec<String>, Vec<StringRecord>), String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("{}: {e}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut records = Vec::new();
    if with_rows {
        for record in reader.records() {
            records.push(record.map_err(|e| format!("{}: {e}", path.display()))?);
        }
    }
    Ok((headers, records))
}

fn project_row(record: &StringRecord, columns: &[(usize, &str)]) -> Record {
    let mut row = Record::new();
    let mut extras = Map::new();
    for (index, field) in columns {
        let Some(raw) = record.get(*index).filter(|v| !v.is_empty()) else {
            continue;
        };
        if is_custom_field(field) {
            let key = field.trim_start_matches(CUSTOM_PREFIX);
            extras.insert(key.to_string(), cell_value(raw));
        } else {
            row.insert((*field).to_string(), cell_value(raw));
        }
    }
    if !extras.is_empty() {
        row.insert(EXTRAS_KEY.to_string(), Value::Object(extras));
    }
    row
}

/// Numbers stay numbers, everything else is text.
fn cell_value(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(raw.to_string()), Value::Number)
}

fn row_player(row: &Record) -> String {
    match row.get(PLAYER_FIELD) {
        Some(Value::String(s)) => redact_value(s).to_string(),
        Some(other) => redact_value(&other.to_string()).to_string(),
        None => String::new(),
    }
}

fn players_affected(rows: &[Record]) -> usize {
    rows.iter()
        .filter_map(|row| row.get(PLAYER_FIELD))
        .map(Value::to_string)
        .collect::<BTreeSet<_>>()
        .len()
}

fn date_range(rows: &[Record]) -> Option<String> {
    let dates: BTreeSet<String> = rows
        .iter()
        .filter_map(|row| row.get(DATE_FIELD))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    let first = dates.first()?;
    let last = dates.last()?;
    if first == last {
        Some(first.clone())
    } else {
        Some(format!("{first} to {last}"))
    }
}

/// Header → field mapping parsed from `H=F` pairs.
pub fn parse_pairs<'a>(
    pairs: impl IntoIterator<Item = &'a String>,
) -> Result<BTreeMap<String, String>, String> {
    let mut out = BTreeMap::new();
    for pair in pairs {
        let (left, right) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected LEFT=RIGHT, got '{pair}'"))?;
        let (left, right) = (left.trim(), right.trim());
        if left.is_empty() || right.is_empty() {
            return Err(format!("expected LEFT=RIGHT, got '{pair}'"));
        }
        out.insert(left.to_string(), right.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_text_are_typed() {
        assert_eq!(cell_value("42"), Value::from(42));
        assert_eq!(cell_value("7,5"), Value::from(7.5));
        assert_eq!(cell_value("Rossi"), Value::from("Rossi"));
    }

    #[test]
    fn custom_fields_nest_under_extras() {
        let record = StringRecord::from(vec!["P1", "6"]);
        let row = project_row(&record, &[(0, "playerId"), (1, "custom.rpe")]);
        assert_eq!(row.get("playerId"), Some(&Value::from("P1")));
        assert_eq!(row[EXTRAS_KEY]["rpe"], Value::from(6));
    }

    #[test]
    fn date_range_spans_min_and_max() {
        let rows: Vec<Record> = ["2024-08-03", "2024-08-01", "2024-08-02"]
            .iter()
            .map(|d| Record::from([(DATE_FIELD.to_string(), Value::from(*d))]))
            .collect();
        assert_eq!(
            date_range(&rows).as_deref(),
            Some("2024-08-01 to 2024-08-03")
        );
        assert_eq!(date_range(&[]), None);
    }

    #[test]
    fn pairs_require_both_sides() {
        let ok = ["Player Name = playerId".to_string()];
        assert_eq!(
            parse_pairs(&ok).unwrap().get("Player Name").map(String::as_str),
            Some("playerId")
        );
        assert!(parse_pairs(&["nope".to_string()]).is_err());
        assert!(parse_pairs(&["=x".to_string()]).is_err());
    }
}
