//! Service layer - the import pipeline
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one step: inferring a mapping, reading a file, shaping drafts,
//! validating them, attributing failures, and the wizard tying them together.

pub mod attribution;
pub mod ingest;
mod mapper;
mod normalize;
pub mod session;
pub mod validation;

pub use attribution::{Diagnostic, ErrorAttributor, ErrorLocator};
pub use ingest::{decode_content, read_file, DelimitedResult, FileIngestor, FileKind, Ingested, PREVIEW_ROW_LIMIT};
pub use mapper::ColumnMapper;
pub use normalize::ActivityNormalizer;
pub use session::{ImportSession, ImportWizard, PendingValidation, Resolution, Ticket, WizardState};
pub use validation::{
    FailureKind, ValidatedActivities, ValidationCoordinator, ValidationFailure, ValidationOutcome,
};
