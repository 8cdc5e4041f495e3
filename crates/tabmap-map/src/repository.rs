//! Template repository for reusing mappings across files with the same layout.
//!
//! A template is stored per header fingerprint as `{fingerprint}.json` in the
//! repository directory. Lookup tries the exact fingerprint first, then the
//! stored template whose normalized header set is most similar (Jaccard).
//!
//! # Storage Format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "fingerprint": "…sha256 hex…",
//!   "savedAt": "2024-08-25T10:00:00+00:00",
//!   "headersNormalized": ["date", "player", "totaldistance"],
//!   "mapping": { "Player": "playerId" },
//!   "meta": { "vendor": "Catapult" }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{MappingError, Result};
use crate::utils::normalize;

const TEMPLATE_VERSION: &str = "1.0";

fn default_version() -> String {
    TEMPLATE_VERSION.to_string()
}

/// A stored header → field mapping for one file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingTemplate {
    #[serde(default = "default_version")]
    pub version: String,
    pub fingerprint: String,
    /// RFC 3339 timestamp.
    pub saved_at: String,
    /// Sorted normalized headers of the file the template was learned from.
    pub headers_normalized: Vec<String>,
    /// Raw header → field key.
    pub mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl MappingTemplate {
    /// Field for a header, matched on normalized text.
    pub fn field_for(&self, header: &str) -> Option<&str> {
        if let Some(field) = self.mapping.get(header) {
            return Some(field);
        }
        let wanted = normalize(header);
        self.mapping
            .iter()
            .find(|(stored, _)| normalize(stored) == wanted)
            .map(|(_, field)| field.as_str())
    }
}

/// How a template was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMatchKind {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch {
    pub template: MappingTemplate,
    pub kind: TemplateMatchKind,
    /// 1.0 for exact matches, Jaccard similarity otherwise.
    pub score: f64,
}

/// SHA-256 hex of the sorted normalized headers joined with `|`.
pub fn fingerprint(headers: &[String]) -> String {
    let normalized = normalized_sorted(headers);
    let mut hasher = Sha256::new();
    hasher.update(normalized.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

fn normalized_sorted(headers: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    normalized.sort();
    normalized
}

/// Jaccard similarity of two normalized header sets.
pub fn jaccard_similarity<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a: BTreeSet<String> = a.iter().map(|h| normalize(h.as_ref())).collect();
    let b: BTreeSet<String> = b.iter().map(|h| normalize(h.as_ref())).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Whether a commit went well enough to learn its mapping.
pub fn should_learn(success_rate: f64, learn_min_success_rate: f64) -> bool {
    success_rate >= learn_min_success_rate
}

/// Directory of mapping templates.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    base_dir: PathBuf,
}

impl TemplateRepository {
    /// Open a repository, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| io_error(&base_dir, e))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Store the mapping learned for a header list, replacing any previous one.
    pub fn save(
        &self,
        headers: &[String],
        mapping: &BTreeMap<String, String>,
        meta: BTreeMap<String, String>,
    ) -> Result<MappingTemplate> {
        let template = MappingTemplate {
            version: default_version(),
            fingerprint: fingerprint(headers),
            saved_at: chrono::Utc::now().to_rfc3339(),
            headers_normalized: normalized_sorted(headers),
            mapping: mapping.clone(),
            meta,
        };
        let path = self.path_for(&template.fingerprint);
        let json = serde_json::to_string_pretty(&template).map_err(|e| {
            MappingError::TemplateFormat {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;
        info!(
            fingerprint = %template.fingerprint,
            fields = template.mapping.len(),
            "saved mapping template"
        );
        Ok(template)
    }

    /// Template stored under the exact fingerprint of `headers`.
    pub fn load_exact(&self, headers: &[String]) -> Result<Option<MappingTemplate>> {
        let path = self.path_for(&fingerprint(headers));
        if !path.exists() {
            return Ok(None);
        }
        read_template(&path).map(Some)
    }

    /// All readable templates. Unreadable files are logged and skipped.
    pub fn list(&self) -> Result<Vec<MappingTemplate>> {
        let mut templates = Vec::new();
        let entries = fs::read_dir(&self.base_dir).map_err(|e| io_error(&self.base_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.base_dir, e))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_template(&path) {
                Ok(template) => templates.push(template),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping template"),
            }
        }
        templates.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
        Ok(templates)
    }

    /// Exact fingerprint match, else the most similar template at or above
    /// `fuzzy_min`.
    pub fn find(&self, headers: &[String], fuzzy_min: f64) -> Result<Option<TemplateMatch>> {
        if let Some(template) = self.load_exact(headers)? {
            debug!(fingerprint = %template.fingerprint, "exact template match");
            return Ok(Some(TemplateMatch {
                template,
                kind: TemplateMatchKind::Exact,
                score: 1.0,
            }));
        }

        let mut best: Option<(MappingTemplate, f64)> = None;
        for template in self.list()? {
            let score = jaccard_similarity(headers, &template.headers_normalized);
            if best.as_ref().is_none_or(|(_, top)| score > *top) {
                best = Some((template, score));
            }
        }
        Ok(best
            .filter(|(_, score)| *score >= fuzzy_min)
            .map(|(template, score)| {
                debug!(fingerprint = %template.fingerprint, score, "fuzzy template match");
                TemplateMatch {
                    template,
                    kind: TemplateMatchKind::Fuzzy,
                    score,
                }
            }))
    }

    /// Remove a stored template. Returns whether one existed.
    ///
    /// Anything that is not a hex fingerprint is treated as absent.
    pub fn delete(&self, fingerprint: &str) -> Result<bool> {
        if fingerprint.is_empty() || !fingerprint.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(false);
        }
        let path = self.path_for(fingerprint);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
        info!(fingerprint, "deleted mapping template");
        Ok(true)
    }

    fn path_for(&self, fingerprint: &str) -> PathBuf {
        self.base_dir.join(format!("{fingerprint}.json"))
    }
}

fn read_template(path: &Path) -> Result<MappingTemplate> {
    let contents = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    serde_json::from_str(&contents).map_err(|e| MappingError::TemplateFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn io_error(path: &Path, err: std::io::Error) -> MappingError {
    MappingError::TemplateIo {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
