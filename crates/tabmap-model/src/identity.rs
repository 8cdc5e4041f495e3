use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

const FILE_ID_TAG: &str = "file:";
const HEADERS_TAG: &str = "headers:";
const HEADER_SEPARATOR: char = '\u{1f}';

/// Key under which per-file decisions (dismissals) are remembered.
///
/// A server-issued file id wins; without one, the sorted header list is used
/// so that re-uploading a structurally identical file resumes the same state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FileIdentity {
    /// Identifier issued by the header acquisition service.
    FileId(String),
    /// Sorted header list joined with the ASCII unit separator.
    Structural(String),
}

impl FileIdentity {
    /// Resolve the identity for a header list, preferring a non-blank file id.
    pub fn resolve(file_id: Option<&str>, headers: &[String]) -> Self {
        match file_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::FileId(id.to_string()),
            None => Self::structural(headers),
        }
    }

    /// Structural key: order-insensitive, exact on header text.
    pub fn structural(headers: &[String]) -> Self {
        let mut sorted: Vec<&str> = headers.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let mut key = String::new();
        for (idx, header) in sorted.iter().enumerate() {
            if idx > 0 {
                key.push(HEADER_SEPARATOR);
            }
            key.push_str(header);
        }
        Self::Structural(key)
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileId(id) => write!(f, "{FILE_ID_TAG}{id}"),
            Self::Structural(key) => write!(f, "{HEADERS_TAG}{key}"),
        }
    }
}

impl FromStr for FileIdentity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix(FILE_ID_TAG) {
            return Ok(Self::FileId(id.to_string()));
        }
        if let Some(key) = s.strip_prefix(HEADERS_TAG) {
            return Ok(Self::Structural(key.to_string()));
        }
        Err(ModelError::InvalidIdentity(s.to_string()))
    }
}

impl From<FileIdentity> for String {
    fn from(identity: FileIdentity) -> Self {
        identity.to_string()
    }
}

impl TryFrom<String> for FileIdentity {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn file_id_wins_over_structure() {
        let identity = FileIdentity::resolve(Some("abc-123"), &headers(&["A", "B"]));
        assert_eq!(identity, FileIdentity::FileId("abc-123".to_string()));
    }

    #[test]
    fn blank_file_id_falls_back_to_structure() {
        let identity = FileIdentity::resolve(Some("  "), &headers(&["B", "A"]));
        assert!(identity.is_structural());
        assert_eq!(identity, FileIdentity::structural(&headers(&["A", "B"])));
    }

    #[test]
    fn structural_key_ignores_order() {
        assert_eq!(
            FileIdentity::structural(&headers(&["Minutes", "Player", "Date"])),
            FileIdentity::structural(&headers(&["Date", "Minutes", "Player"]))
        );
        assert_ne!(
            FileIdentity::structural(&headers(&["Date", "Player"])),
            FileIdentity::structural(&headers(&["date", "Player"]))
        );
    }

    #[test]
    fn string_form_parses_back() {
        let identity = FileIdentity::structural(&headers(&["x", "y"]));
        let parsed: FileIdentity = identity.to_string().parse().unwrap();
        assert_eq!(parsed, identity);
        assert!("nonsense".parse::<FileIdentity>().is_err());
    }
}
