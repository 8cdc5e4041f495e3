//! Settings file (`tabmap.toml`).
//!
//! Every section is optional; a missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabmap_catalog::{CatalogError, FieldCatalog};
use tabmap_map::{MappingError, MatchThresholds};
use tabmap_wizard::{DisplayCaps, RecomputeConfig, SessionOptions, WizardOptions};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_SETTINGS_FILE: &str = "tabmap.toml";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("Failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Thresholds(#[from] MappingError),

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub matching: MatchingSettings,
    pub recompute: RecomputeConfig,
    pub display: DisplayCaps,
    pub templates: TemplateSettings,
    pub catalog: CatalogSettings,
}

/// Confidence thresholds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub surface_min: u8,
    pub pending_min: u8,
    pub accept_all_min: u8,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        let defaults = MatchThresholds::default();
        Self {
            surface_min: defaults.surface_min,
            pending_min: defaults.pending_min,
            accept_all_min: defaults.accept_all_min,
        }
    }
}

impl MatchingSettings {
    pub fn thresholds(&self) -> MatchThresholds {
        MatchThresholds {
            surface_min: self.surface_min,
            pending_min: self.pending_min,
            accept_all_min: self.accept_all_min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    pub enabled: bool,
    pub dir: PathBuf,
    /// Jaccard similarity needed to reuse a template from another layout.
    pub fuzzy_min: f64,
    /// Commit success rate (percent) needed to learn a template.
    pub learn_min_success_rate: f64,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".tabmap/templates"),
            fuzzy_min: 0.7,
            learn_min_success_rate: 80.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Replaces the embedded field catalog.
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Load and validate settings. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let settings: Self = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.matching.thresholds().validate()?;
        if !(0.0..=1.0).contains(&self.templates.fuzzy_min) {
            return Err(SettingsError::Invalid {
                key: "templates.fuzzy_min",
                message: format!("{} is not between 0 and 1", self.templates.fuzzy_min),
            });
        }
        if !(0.0..=100.0).contains(&self.templates.learn_min_success_rate) {
            return Err(SettingsError::Invalid {
                key: "templates.learn_min_success_rate",
                message: format!(
                    "{} is not between 0 and 100",
                    self.templates.learn_min_success_rate
                ),
            });
        }
        Ok(())
    }

    pub fn wizard_options(&self) -> WizardOptions {
        WizardOptions {
            session: SessionOptions {
                thresholds: self.matching.thresholds(),
                recompute: self.recompute,
            },
            template_fuzzy_min: self.templates.fuzzy_min,
            learn_min_success_rate: self.templates.learn_min_success_rate,
            ..WizardOptions::default()
        }
    }

    /// The override catalog if configured, else the embedded one.
    pub fn load_catalog(&self) -> Result<FieldCatalog, CatalogError> {
        match &self.catalog.path {
            Some(path) => FieldCatalog::load(path),
            None => FieldCatalog::embedded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.recompute.coalesce_ms, 150);
        assert_eq!(settings.display.preview_rows, 20);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabmap.toml");
        fs::write(&path, "[matching]\naccept_all_min = 90\n[display]\ncommit_errors = 2\n")
            .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.matching.accept_all_min, 90);
        assert_eq!(settings.matching.surface_min, 60);
        assert_eq!(settings.display.commit_errors, 2);
        assert!(settings.templates.enabled);
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabmap.toml");
        fs::write(&path, "[matching]\nsurface_min = 90\npending_min = 75\n").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Thresholds(_))
        ));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tabmap.toml");
        let mut settings = Settings::default();
        settings.templates.fuzzy_min = 0.5;
        settings.catalog.path = Some(PathBuf::from("fields.csv"));
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn out_of_range_fuzzy_min_is_rejected() {
        let mut settings = Settings::default();
        settings.templates.fuzzy_min = 1.5;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid {
                key: "templates.fuzzy_min",
                ..
            })
        ));
    }
}
