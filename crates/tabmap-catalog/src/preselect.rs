//! Fixed default preselections applied before any heuristic matching.

/// What a known header defaults to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPreselection {
    /// Map the header to this field key.
    Field(&'static str),
    /// Leave the header unmapped and skip eager auto-matching for it.
    DoNotMap,
}

/// Exact header text to default preselection.
const DEFAULT_PRESELECTIONS: &[(&str, DefaultPreselection)] = &[
    ("playerId", DefaultPreselection::Field("playerId")),
    ("session_date", DefaultPreselection::Field("session_date")),
    ("duration_minutes", DefaultPreselection::DoNotMap),
];

/// Look up the default preselection for a raw header (exact match).
pub fn default_preselection(header: &str) -> Option<DefaultPreselection> {
    DEFAULT_PRESELECTIONS
        .iter()
        .find(|(name, _)| *name == header)
        .map(|(_, preselection)| *preselection)
}

/// All preselection entries, for display.
pub fn default_preselections() -> &'static [(&'static str, DefaultPreselection)] {
    DEFAULT_PRESELECTIONS
}
