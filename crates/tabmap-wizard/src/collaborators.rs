//! Boundaries to the services the wizard depends on.
//!
//! The wizard never parses files or writes rows itself. Header acquisition,
//! transformation and commit are delegated to implementations of these
//! traits; the CLI provides local file-based ones.

use tabmap_model::{AcquiredHeaders, CommitResponse, PreviewResponse, TransformRequest};

use crate::error::UpstreamError;

/// Reads the header row of an uploaded file.
pub trait HeaderSource {
    /// Return the file id and its headers, or fail with
    /// [`UpstreamKind::NoHeadersFound`](crate::UpstreamKind::NoHeadersFound).
    fn acquire_headers(&self) -> Result<AcquiredHeaders, UpstreamError>;
}

/// Applies a mapping to the file and returns transformed rows for review.
pub trait TransformService {
    fn preview(&self, request: &TransformRequest) -> Result<PreviewResponse, UpstreamError>;
}

/// Persists the transformed rows.
pub trait CommitService {
    fn commit(&self, request: &TransformRequest) -> Result<CommitResponse, UpstreamError>;
}
