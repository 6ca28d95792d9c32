//! Validation coordinator - dry-run drafts against the oracle
//!
//! Every call is a dry run; nothing here persists anything. Failures are
//! turned into a message list plus a one-line summary instead of escaping.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Error;
use crate::domain::{ActivityDraft, ColumnMapping};
use crate::ports::{DryRunRequest, ValidationContext, ValidationOracle};

/// Activities accepted by the oracle, most recent first
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedActivities {
    pub activities: Vec<ActivityDraft>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The oracle answered and refused the drafts
    Rejected,
    /// The oracle could not be reached
    Transport,
}

/// Why a dry run did not succeed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    /// Every message, in the order the oracle gave them
    pub messages: Vec<String>,
    /// Always non-empty
    pub summary: String,
    pub kind: FailureKind,
}

impl From<Error> for ValidationFailure {
    fn from(error: Error) -> Self {
        let kind = match error {
            Error::Transport(_) => FailureKind::Transport,
            _ => FailureKind::Rejected,
        };
        Self {
            messages: error.messages(),
            summary: error.summary(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ValidationOutcome {
    Success(ValidatedActivities),
    Failure(ValidationFailure),
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Success(_))
    }
}

/// Dry-run validation against a [`ValidationOracle`]
#[derive(Clone)]
pub struct ValidationCoordinator {
    oracle: Arc<dyn ValidationOracle>,
}

impl ValidationCoordinator {
    pub fn new(oracle: Arc<dyn ValidationOracle>) -> Self {
        Self { oracle }
    }

    pub async fn validate(
        &self,
        drafts: Vec<ActivityDraft>,
        mapping: Option<&ColumnMapping>,
        context: &ValidationContext,
    ) -> ValidationOutcome {
        let request = DryRunRequest::new(drafts, mapping.cloned(), context.clone());
        log::debug!("Submitting {} drafts for dry-run validation", request.activities.len());

        match self.oracle.dry_run(&request).await {
            Ok(response) => {
                let mut activities = response.activities;
                activities.reverse();
                let total = activities.len();
                log::info!("Dry run accepted {} activities", total);
                ValidationOutcome::Success(ValidatedActivities { activities, total })
            }
            Err(error) => {
                match &error {
                    Error::Transport(reason) => log::warn!("Dry run failed: {}", reason),
                    other => log::info!(
                        "Dry run rejected with {} messages",
                        other.messages().len()
                    ),
                }
                ValidationOutcome::Failure(error.into())
            }
        }
    }
}
