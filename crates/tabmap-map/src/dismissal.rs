//! Per-file memory of headers the operator already resolved.
//!
//! Dismissed headers (suggestion accepted, rejected, or mapped by hand) are
//! excluded from suggestion generation. The set is keyed by file identity and
//! swapped out when the active file changes, so coming back to a file
//! restores its earlier decisions.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tabmap_model::FileIdentity;
use tracing::debug;

use crate::error::{MappingError, Result};
use crate::utils::normalize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DismissalTracker {
    /// Identity whose set is currently loaded.
    active: Option<FileIdentity>,
    /// Normalized header keys dismissed for the active identity.
    current: BTreeSet<String>,
    /// Sets of identities that are not active.
    saved: BTreeMap<FileIdentity, BTreeSet<String>>,
}

impl DismissalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&mut self, header: &str) {
        let key = normalize(header);
        if self.current.insert(key) {
            debug!(header, "dismissed column");
        }
    }

    pub fn is_dismissed(&self, header: &str) -> bool {
        self.current.contains(&normalize(header))
    }

    /// Re-enable suggestions for a header. Returns whether it was dismissed.
    pub fn reinstate(&mut self, header: &str) -> bool {
        let removed = self.current.remove(&normalize(header));
        if removed {
            debug!(header, "reinstated column");
        }
        removed
    }

    /// Make `identity` the active file.
    ///
    /// The outgoing set is saved under the outgoing identity; the incoming
    /// set is restored, or starts empty on first encounter.
    pub fn swap_file_context(&mut self, identity: FileIdentity) {
        if self.active.as_ref() == Some(&identity) {
            return;
        }
        if let Some(outgoing) = self.active.take() {
            let set = std::mem::take(&mut self.current);
            if set.is_empty() {
                self.saved.remove(&outgoing);
            } else {
                self.saved.insert(outgoing, set);
            }
        }
        self.current = self.saved.remove(&identity).unwrap_or_default();
        debug!(
            identity = %identity,
            restored = self.current.len(),
            "switched dismissal context"
        );
        self.active = Some(identity);
    }

    pub fn active(&self) -> Option<&FileIdentity> {
        self.active.as_ref()
    }

    /// Normalized keys dismissed for the active file.
    pub fn dismissed(&self) -> &BTreeSet<String> {
        &self.current
    }

    /// Number of identities with remembered dismissals, the active one included.
    pub fn known_files(&self) -> usize {
        self.saved.len() + usize::from(self.active.is_some() && !self.current.is_empty())
    }

    /// Load a tracker from a JSON state file; a missing file yields an empty tracker.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| MappingError::StateIo {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| MappingError::StateFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the tracker to a JSON state file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let io_err = |e: std::io::Error| MappingError::StateIo {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| MappingError::StateFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content).map_err(io_err)
    }
}
