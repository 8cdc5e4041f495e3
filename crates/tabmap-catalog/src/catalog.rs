//! Ordered registry of target fields.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use serde::Deserialize;
use tabmap_model::FieldDefinition;
use tracing::debug;

use crate::embedded;
use crate::error::{CatalogError, Result};

/// Row from fields.csv.
#[derive(Debug, Deserialize)]
struct FieldCsvRow {
    key: String,
    label: String,
    required: String,
    category: String,
    #[serde(default)]
    example: String,
    #[serde(default)]
    description: String,
}

/// Target fields keyed by field key, iterated in insertion (display) order.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<FieldDefinition>,
    index: BTreeMap<String, usize>,
}

impl FieldCatalog {
    /// Load the catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_csv_str(embedded::FIELDS_CSV, "embedded fields.csv")
    }

    /// Load a catalog override from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_str(&content, &path.display().to_string())
    }

    /// Parse catalog CSV content (`key,label,required,category,example,description`).
    pub fn from_csv_str(content: &str, file: &str) -> Result<Self> {
        let cursor = Cursor::new(content.as_bytes());
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(cursor);

        let mut catalog = Self::default();
        for result in reader.deserialize::<FieldCsvRow>() {
            let row = result.map_err(|e| CatalogError::CsvParse {
                file: file.to_string(),
                message: e.to_string(),
            })?;
            if row.key.is_empty() {
                continue;
            }
            let required = parse_required(&row.required).ok_or_else(|| {
                CatalogError::InvalidValue {
                    column: "required",
                    value: row.required.clone(),
                    file: file.to_string(),
                }
            })?;
            catalog.insert(FieldDefinition {
                key: row.key,
                label: row.label,
                required,
                category: row.category,
                example: row.example,
                description: row.description,
            })?;
        }

        if catalog.is_empty() {
            return Err(CatalogError::Empty(file.to_string()));
        }
        debug!(
            file,
            fields = catalog.len(),
            required = catalog.required_keys().count(),
            "loaded field catalog"
        );
        Ok(catalog)
    }

    /// Build a catalog from definitions, rejecting duplicate keys.
    pub fn from_fields(fields: impl IntoIterator<Item = FieldDefinition>) -> Result<Self> {
        let mut catalog = Self::default();
        for field in fields {
            catalog.insert(field)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, field: FieldDefinition) -> Result<()> {
        if self.index.contains_key(&field.key) {
            return Err(CatalogError::DuplicateKey(field.key));
        }
        self.index.insert(field.key.clone(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    /// Register an operator-defined field from a free-text label.
    ///
    /// Registering the same label twice returns the existing definition.
    pub fn add_custom(&mut self, label: &str) -> Result<&FieldDefinition> {
        let field = FieldDefinition::custom(label)?;
        if let Some(idx) = self.index.get(&field.key).copied() {
            return Ok(&self.fields[idx]);
        }
        debug!(key = %field.key, "registered custom field");
        let idx = self.fields.len();
        self.insert(field)?;
        Ok(&self.fields[idx])
    }

    pub fn get(&self, key: &str) -> Option<&FieldDefinition> {
        self.index.get(key).map(|idx| &self.fields[*idx])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Fields in display order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Keys of the minimum viable field set, in display order.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn parse_required(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "req" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_required_accepts_common_spellings() {
        assert_eq!(parse_required("TRUE"), Some(true));
        assert_eq!(parse_required("Req"), Some(true));
        assert_eq!(parse_required(""), Some(false));
        assert_eq!(parse_required("maybe"), None);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let csv = "key,label,required,category\na,A,true,X\na,Again,false,X\n";
        let err = FieldCatalog::from_csv_str(csv, "dup.csv").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey(key) if key == "a"));
    }

    #[test]
    fn add_custom_is_idempotent() {
        let mut catalog = FieldCatalog::embedded().unwrap();
        let before = catalog.len();
        let key = catalog.add_custom("RPE").unwrap().key.clone();
        catalog.add_custom(" rpe ").unwrap();
        assert_eq!(key, "custom.rpe");
        assert_eq!(catalog.len(), before + 1);
        assert!(catalog.contains("custom.rpe"));
    }
}
