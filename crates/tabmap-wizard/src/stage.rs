//! Wizard stages and the per-stage state they carry.

use std::fmt;

use tabmap_map::DismissalTracker;
use tabmap_model::{CommitResponse, MappingResult, PreviewResponse};

use crate::session::ImportSession;

/// The four steps of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AcquireHeaders,
    ResolveMapping,
    Preview,
    Committed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AcquireHeaders => "acquire headers",
            Stage::ResolveMapping => "resolve mapping",
            Stage::Preview => "preview",
            Stage::Committed => "committed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current stage together with the state that belongs to it.
///
/// Moving between stages replaces the whole value, so data scoped to a
/// stage (the preview rows, the commit response) disappears with it.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum WizardState {
    /// Waiting for a header list. Holds the dismissal memory carried over
    /// from earlier sessions.
    AcquireHeaders { dismissals: DismissalTracker },

    /// Operator is editing the mapping.
    ResolveMapping {
        session: ImportSession,
        /// Snapshot taken on the last advance to preview, kept after going back.
        frozen: Option<MappingResult>,
    },

    /// Mapping is frozen; transformed rows may be loaded for review.
    Preview {
        session: ImportSession,
        result: MappingResult,
        preview: Option<PreviewResponse>,
    },

    /// Commit finished. Only reset leaves this stage.
    Committed {
        session: ImportSession,
        result: MappingResult,
        response: CommitResponse,
    },
}

impl Default for WizardState {
    fn default() -> Self {
        Self::AcquireHeaders {
            dismissals: DismissalTracker::default(),
        }
    }
}

impl WizardState {
    pub fn stage(&self) -> Stage {
        match self {
            Self::AcquireHeaders { .. } => Stage::AcquireHeaders,
            Self::ResolveMapping { .. } => Stage::ResolveMapping,
            Self::Preview { .. } => Stage::Preview,
            Self::Committed { .. } => Stage::Committed,
        }
    }

    pub fn session(&self) -> Option<&ImportSession> {
        match self {
            Self::AcquireHeaders { .. } => None,
            Self::ResolveMapping { session, .. }
            | Self::Preview { session, .. }
            | Self::Committed { session, .. } => Some(session),
        }
    }

    /// Frozen mapping result, if one was taken.
    pub fn mapping_result(&self) -> Option<&MappingResult> {
        match self {
            Self::AcquireHeaders { .. } => None,
            Self::ResolveMapping { frozen, .. } => frozen.as_ref(),
            Self::Preview { result, .. } | Self::Committed { result, .. } => Some(result),
        }
    }

    pub fn dismissals(&self) -> &DismissalTracker {
        match self {
            Self::AcquireHeaders { dismissals } => dismissals,
            Self::ResolveMapping { session, .. }
            | Self::Preview { session, .. }
            | Self::Committed { session, .. } => session.dismissals(),
        }
    }

    /// Drop everything but the dismissal memory.
    pub(crate) fn into_dismissals(self) -> DismissalTracker {
        match self {
            Self::AcquireHeaders { dismissals } => dismissals,
            Self::ResolveMapping { session, .. }
            | Self::Preview { session, .. }
            | Self::Committed { session, .. } => session.into_dismissals(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_waits_for_headers() {
        let state = WizardState::default();
        assert_eq!(state.stage(), Stage::AcquireHeaders);
        assert!(state.session().is_none());
        assert!(state.mapping_result().is_none());
    }

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::ResolveMapping.to_string(), "resolve mapping");
        assert_eq!(Stage::Committed.as_str(), "committed");
    }
}
