//! Import wizard: drives one [`ImportSession`] through the stages.
//!
//! ```text
//! AcquireHeaders ──headers──▶ ResolveMapping ──complete──▶ Preview ──confirm──▶ Committed
//!        ▲                      │      ▲                      │
//!        └────────back──────────┘      └────────back──────────┘
//! any stage ──reset──▶ AcquireHeaders (dismissals kept)
//! ```
//!
//! Collaborator calls are split into `begin_*`/`finish_*` pairs so a caller
//! can run them on its own schedule. Only one request may be in flight; stage
//! changes other than reset are refused until it finishes. A failed request
//! leaves the stage unchanged and is kept in [`ImportWizard::last_error`].

use std::collections::BTreeMap;

use tabmap_catalog::FieldCatalog;
use tabmap_map::{DismissalTracker, TemplateMatch, TemplateRepository, should_learn};
use tabmap_model::{
    AcquiredHeaders, CommitResponse, CommitSummary, FormatHint, MappingResult, PreviewResponse,
    TransformRequest,
};
use tracing::{debug, info, warn};

use crate::collaborators::{CommitService, HeaderSource, TransformService};
use crate::error::{Result, UpstreamError, WizardError};
use crate::request::{RequestGuard, RequestKind, RequestTicket};
use crate::session::{ImportSession, SessionOptions};
use crate::stage::{Stage, WizardState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WizardOptions {
    pub session: SessionOptions,
    pub format_hint: FormatHint,
    /// Minimum Jaccard similarity for reusing a template from another layout.
    pub template_fuzzy_min: f64,
    /// Minimum commit success rate (percent) for learning a template.
    pub learn_min_success_rate: f64,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            format_hint: FormatHint::Auto,
            template_fuzzy_min: 0.7,
            learn_min_success_rate: 80.0,
        }
    }
}

#[derive(Debug)]
pub struct ImportWizard {
    catalog: FieldCatalog,
    options: WizardOptions,
    state: WizardState,
    guard: RequestGuard,
    templates: Option<TemplateRepository>,
    last_error: Option<UpstreamError>,
}

impl ImportWizard {
    pub fn new(catalog: FieldCatalog, options: WizardOptions) -> Result<Self> {
        options.session.thresholds.validate()?;
        Ok(Self {
            catalog,
            options,
            state: WizardState::default(),
            guard: RequestGuard::new(),
            templates: None,
            last_error: None,
        })
    }

    /// Start from dismissal memory saved by an earlier run.
    pub fn with_dismissals(mut self, dismissals: DismissalTracker) -> Self {
        self.state = WizardState::AcquireHeaders { dismissals };
        self
    }

    /// Reuse and learn mapping templates from this repository.
    pub fn with_templates(mut self, templates: TemplateRepository) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    pub fn session(&self) -> Option<&ImportSession> {
        self.state.session()
    }

    /// The session, while the mapping can still be edited.
    pub fn session_mut(&mut self) -> Result<&mut ImportSession> {
        match &mut self.state {
            WizardState::ResolveMapping { session, .. } => Ok(session),
            other => Err(WizardError::InvalidTransition {
                from: other.stage(),
                action: "edit the mapping",
            }),
        }
    }

    pub fn mapping_result(&self) -> Option<&MappingResult> {
        self.state.mapping_result()
    }

    pub fn preview(&self) -> Option<&PreviewResponse> {
        match &self.state {
            WizardState::Preview { preview, .. } => preview.as_ref(),
            _ => None,
        }
    }

    pub fn commit_response(&self) -> Option<&CommitResponse> {
        match &self.state {
            WizardState::Committed { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn dismissals(&self) -> &DismissalTracker {
        self.state.dismissals()
    }

    /// Most recent collaborator failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&UpstreamError> {
        self.last_error.as_ref()
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn in_flight(&self) -> Option<RequestKind> {
        self.guard.in_flight()
    }

    // =========================================================================
    // HEADER ACQUISITION
    // =========================================================================

    pub fn begin_acquire(&mut self) -> Result<RequestTicket> {
        self.expect_stage(Stage::AcquireHeaders, "load headers")?;
        let ticket = self.guard.begin(RequestKind::Acquire)?;
        debug!("header acquisition started");
        Ok(ticket)
    }

    /// Start a session from the acquired headers.
    pub fn finish_acquire(
        &mut self,
        ticket: RequestTicket,
        outcome: std::result::Result<AcquiredHeaders, UpstreamError>,
    ) -> Result<()> {
        self.settle(ticket, RequestKind::Acquire)?;
        let acquired = outcome.and_then(|acquired| {
            if acquired.headers.iter().all(|h| h.trim().is_empty()) {
                Err(UpstreamError::no_headers("the file has no header row"))
            } else {
                Ok(acquired)
            }
        });
        let acquired = acquired.map_err(|err| self.upstream_failed(err))?;

        let template = self.find_template(&acquired.headers);
        let dismissals = std::mem::take(&mut self.state).into_dismissals();
        let session = ImportSession::start(
            acquired,
            self.catalog.clone(),
            dismissals,
            self.options.session,
            template.as_ref(),
        );
        info!(
            stage = %Stage::ResolveMapping,
            valid = session.validation().is_valid,
            "headers received"
        );
        self.last_error = None;
        self.state = WizardState::ResolveMapping {
            session,
            frozen: None,
        };
        Ok(())
    }

    pub fn acquire(&mut self, source: &dyn HeaderSource) -> Result<()> {
        let ticket = self.begin_acquire()?;
        let outcome = source.acquire_headers();
        self.finish_acquire(ticket, outcome)
    }

    // =========================================================================
    // MAPPING
    // =========================================================================

    /// Freeze the mapping and advance to preview.
    ///
    /// Refused with [`WizardError::Validation`] while required fields are
    /// unmapped; the session is left untouched.
    pub fn complete_mapping(&mut self) -> Result<()> {
        self.ensure_idle()?;
        match std::mem::take(&mut self.state) {
            WizardState::ResolveMapping { session, frozen } => {
                if !session.validation().is_valid {
                    let missing = session.validation().missing_required_fields.clone();
                    warn!(missing = ?missing, "mapping incomplete");
                    self.state = WizardState::ResolveMapping { session, frozen };
                    return Err(WizardError::Validation { missing });
                }
                let result = session.snapshot();
                info!(
                    stage = %Stage::Preview,
                    mapped = result.statistics.mapped_headers,
                    unmapped = result.statistics.unmapped_headers,
                    confidence = result.statistics.average_confidence,
                    "mapping completed"
                );
                self.state = WizardState::Preview {
                    session,
                    result,
                    preview: None,
                };
                Ok(())
            }
            other => Err(self.refuse(other, "complete the mapping")),
        }
    }

    /// Step back one stage.
    ///
    /// Leaving the mapping discards it but keeps the file's dismissals.
    /// Leaving the preview keeps both the session and the frozen result.
    pub fn back(&mut self) -> Result<Stage> {
        self.ensure_idle()?;
        match std::mem::take(&mut self.state) {
            WizardState::ResolveMapping { session, .. } => {
                self.state = WizardState::AcquireHeaders {
                    dismissals: session.into_dismissals(),
                };
            }
            WizardState::Preview {
                session, result, ..
            } => {
                self.state = WizardState::ResolveMapping {
                    session,
                    frozen: Some(result),
                };
            }
            other => return Err(self.refuse(other, "go back")),
        }
        self.last_error = None;
        info!(stage = %self.stage(), "moved back");
        Ok(self.stage())
    }

    // =========================================================================
    // PREVIEW
    // =========================================================================

    pub fn begin_preview(&mut self) -> Result<(RequestTicket, TransformRequest)> {
        let request = self.transform_request("load the preview")?;
        let ticket = self.guard.begin(RequestKind::Preview)?;
        debug!(columns = request.mapping.len(), "preview requested");
        Ok((ticket, request))
    }

    pub fn finish_preview(
        &mut self,
        ticket: RequestTicket,
        outcome: std::result::Result<PreviewResponse, UpstreamError>,
    ) -> Result<()> {
        self.settle(ticket, RequestKind::Preview)?;
        let response = outcome.map_err(|err| self.upstream_failed(err))?;
        match &mut self.state {
            WizardState::Preview { preview, .. } => {
                info!(
                    rows = response.rows.len(),
                    errors = response.statistics.error_rows,
                    warnings = response.warnings.len(),
                    "preview loaded"
                );
                *preview = Some(response);
                self.last_error = None;
                Ok(())
            }
            other => Err(WizardError::InvalidTransition {
                from: other.stage(),
                action: "load the preview",
            }),
        }
    }

    pub fn load_preview(&mut self, service: &dyn TransformService) -> Result<()> {
        let (ticket, request) = self.begin_preview()?;
        let outcome = service.preview(&request);
        self.finish_preview(ticket, outcome)
    }

    // =========================================================================
    // COMMIT
    // =========================================================================

    pub fn begin_commit(&mut self) -> Result<(RequestTicket, TransformRequest)> {
        let request = self.transform_request("confirm the import")?;
        let ticket = self.guard.begin(RequestKind::Commit)?;
        debug!(columns = request.mapping.len(), "commit requested");
        Ok((ticket, request))
    }

    /// Record the commit result and move to [`Stage::Committed`].
    ///
    /// A partial commit is still a commit: the per-row errors are kept on
    /// the response and nothing is rolled back.
    pub fn finish_commit(
        &mut self,
        ticket: RequestTicket,
        outcome: std::result::Result<CommitResponse, UpstreamError>,
    ) -> Result<()> {
        self.settle(ticket, RequestKind::Commit)?;
        let response = outcome.map_err(|err| self.upstream_failed(err))?;
        match std::mem::take(&mut self.state) {
            WizardState::Preview {
                session, result, ..
            } => {
                let summary = &response.summary;
                if summary.is_partial() {
                    warn!(
                        imported = summary.successful_imports,
                        errors = summary.errors,
                        "import partially committed"
                    );
                } else {
                    info!(
                        imported = summary.successful_imports,
                        players = summary.players_affected,
                        "import committed"
                    );
                }
                self.learn_template(&session, &result, summary);
                self.last_error = None;
                self.state = WizardState::Committed {
                    session,
                    result,
                    response,
                };
                Ok(())
            }
            other => Err(self.refuse(other, "confirm the import")),
        }
    }

    pub fn confirm(&mut self, service: &dyn CommitService) -> Result<()> {
        let (ticket, request) = self.begin_commit()?;
        let outcome = service.commit(&request);
        self.finish_commit(ticket, outcome)
    }

    // =========================================================================
    // RESET
    // =========================================================================

    /// Return to header acquisition from any stage.
    ///
    /// Drops the session and abandons any in-flight request. The dismissal
    /// memory survives so the same file resumes its earlier decisions.
    pub fn reset(&mut self) {
        let cancelled = self.guard.cancel();
        let from = self.stage();
        let dismissals = std::mem::take(&mut self.state).into_dismissals();
        self.state = WizardState::AcquireHeaders { dismissals };
        self.last_error = None;
        info!(from = %from, cancelled = ?cancelled, "wizard reset");
    }

    fn transform_request(&self, action: &'static str) -> Result<TransformRequest> {
        self.ensure_idle()?;
        match &self.state {
            WizardState::Preview {
                session, result, ..
            } => Ok(TransformRequest {
                file_id: session.file_id().map(str::to_string),
                mapping: result.field_map(),
                format_hint: self.options.format_hint,
            }),
            other => Err(WizardError::InvalidTransition {
                from: other.stage(),
                action,
            }),
        }
    }

    fn find_template(&self, headers: &[String]) -> Option<TemplateMatch> {
        let repo = self.templates.as_ref()?;
        match repo.find(headers, self.options.template_fuzzy_min) {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "template lookup failed");
                None
            }
        }
    }

    fn learn_template(
        &self,
        session: &ImportSession,
        result: &MappingResult,
        summary: &CommitSummary,
    ) {
        let Some(repo) = &self.templates else {
            return;
        };
        if !should_learn(summary.success_rate(), self.options.learn_min_success_rate) {
            debug!(
                success_rate = summary.success_rate(),
                "commit below learning threshold"
            );
            return;
        }
        let mut meta = BTreeMap::new();
        if let Some(file_id) = session.file_id() {
            meta.insert("fileId".to_string(), file_id.to_string());
        }
        if let Err(err) = repo.save(session.headers(), &result.field_map(), meta) {
            warn!(error = %err, "could not save mapping template");
        }
    }

    fn expect_stage(&self, stage: Stage, action: &'static str) -> Result<()> {
        self.ensure_idle()?;
        if self.stage() == stage {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                from: self.stage(),
                action,
            })
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.guard.in_flight() {
            Some(kind) => Err(WizardError::Busy { kind }),
            None => Ok(()),
        }
    }

    fn settle(&mut self, ticket: RequestTicket, kind: RequestKind) -> Result<()> {
        if ticket.kind() != kind {
            return Err(WizardError::NoRequestInFlight { kind });
        }
        self.guard.finish(ticket)
    }

    fn upstream_failed(&mut self, err: UpstreamError) -> WizardError {
        warn!(stage = %self.stage(), error = %err, "request failed");
        self.last_error = Some(err.clone());
        WizardError::Upstream(err)
    }

    /// Put the state back and build the error for a disallowed action.
    fn refuse(&mut self, state: WizardState, action: &'static str) -> WizardError {
        let from = state.stage();
        self.state = state;
        WizardError::InvalidTransition { from, action }
    }
}
