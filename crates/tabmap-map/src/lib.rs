//! Column-to-field mapping engine.
//!
//! - [`utils::normalize`] turns a raw header into a comparison key.
//! - [`engine::SuggestionGenerator`] proposes fields per header through the
//!   exact → similar → pattern → weak cascade.
//! - [`state::MappingStore`] holds the injective header → field table, seeds
//!   defaults and applies eager auto-matches.
//! - [`dismissal::DismissalTracker`] remembers resolved headers per file.
//! - [`validate::MinimumSetValidator`] gates progress on required fields.
//! - [`repository::TemplateRepository`] reuses mappings by header fingerprint.

#![deny(unsafe_code)]

pub mod dismissal;
pub mod engine;
pub mod error;
pub mod patterns;
pub mod repository;
pub mod score;
pub mod state;
pub mod utils;
pub mod validate;

pub use dismissal::DismissalTracker;
pub use engine::{MatchThresholds, SuggestionGenerator, SuggestionSet, TierMatch, match_header};
pub use error::{MappingError, Result};
pub use patterns::{PATTERN_RULES, PatternRule};
pub use repository::{
    MappingTemplate, TemplateMatch, TemplateMatchKind, TemplateRepository, fingerprint,
    jaccard_similarity, should_learn,
};
pub use score::{RankedField, rank_fields};
pub use state::MappingStore;
pub use utils::normalize;
pub use validate::MinimumSetValidator;
