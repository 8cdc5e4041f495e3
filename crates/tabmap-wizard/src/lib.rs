//! Import wizard for tabular files.
//!
//! An [`ImportWizard`] owns one [`ImportSession`] at a time and moves it
//! through header acquisition, mapping, preview and commit. File parsing,
//! transformation and persistence stay behind the [`HeaderSource`],
//! [`TransformService`] and [`CommitService`] traits.

pub mod collaborators;
pub mod display;
pub mod error;
pub mod request;
pub mod scheduler;
pub mod session;
pub mod stage;
pub mod wizard;

pub use collaborators::{CommitService, HeaderSource, TransformService};
pub use display::DisplayCaps;
pub use error::{Result, UpstreamError, UpstreamKind, WizardError};
pub use request::{RequestGuard, RequestKind, RequestTicket};
pub use scheduler::{RecomputeConfig, RecomputeScheduler};
pub use session::{AcceptAllOutcome, AppliedTemplate, ImportSession, SessionOptions};
pub use stage::{Stage, WizardState};
pub use wizard::{ImportWizard, WizardOptions};
