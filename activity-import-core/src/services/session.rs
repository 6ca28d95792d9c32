//! Import wizard - the state machine driving one import
//!
//! States and transitions:
//!
//! ```text
//! SelectFile --(delimited file)--------------> MapColumns
//! SelectFile --(structured file, dry run ok)--> SelectActivities
//! MapColumns --(apply mapping, dry run ok)----> SelectActivities
//! MapColumns --(back)-------------------------> SelectFile
//! SelectActivities --(commit)-----------------> SelectFile
//! any --(reset)--> MapColumns (delimited session) or SelectFile
//! ```
//!
//! All per-import data lives in one [`ImportSession`] that is replaced whole on
//! every transition. Dry runs are tagged with a [`Ticket`]; only the ticket of
//! the latest submission is applied, so a response that arrives after a reset,
//! a new file or a newer submission is dropped.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    ActivityDraft, CanonicalField, ColumnMapping, RawDataRow, SourceRows, StructuredImportBundle,
};
use crate::ports::{ActivityImporter, ImportRequest, ValidationContext};

use super::attribution::{Diagnostic, ErrorAttributor};
use super::ingest::{FileIngestor, Ingested};
use super::mapper::ColumnMapper;
use super::normalize::ActivityNormalizer;
use super::validation::{ValidationCoordinator, ValidationOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardState {
    SelectFile,
    MapColumns,
    SelectActivities,
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardState::SelectFile => "selecting a file",
            WizardState::MapColumns => "mapping columns",
            WizardState::SelectActivities => "selecting activities",
        };
        f.write_str(name)
    }
}

/// Everything known about the import in progress
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: WizardState,
    pub file_name: Option<String>,
    #[serde(skip)]
    pub source: Option<SourceRows>,
    pub columns: Vec<String>,
    pub preview_rows: Vec<RawDataRow>,
    pub mapping: ColumnMapping,
    /// Drafts last submitted for validation
    #[serde(skip)]
    pub drafts: Vec<ActivityDraft>,
    /// Activities accepted by the dry run, most recent first
    pub activities: Vec<ActivityDraft>,
    pub total: usize,
    /// Indices into `activities`
    pub selection: BTreeSet<usize>,
    pub summary: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportSession {
    fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: WizardState::SelectFile,
            file_name: None,
            source: None,
            columns: Vec::new(),
            preview_rows: Vec::new(),
            mapping: ColumnMapping::new(),
            drafts: Vec::new(),
            activities: Vec::new(),
            total: 0,
            selection: BTreeSet::new(),
            summary: None,
            diagnostics: Vec::new(),
        }
    }

    /// Same file and mapping, nothing derived from a dry run
    fn cleared(&self) -> Self {
        Self {
            drafts: Vec::new(),
            activities: Vec::new(),
            total: 0,
            selection: BTreeSet::new(),
            summary: None,
            diagnostics: Vec::new(),
            ..self.clone()
        }
    }

    fn bundle(&self) -> Option<&StructuredImportBundle> {
        match &self.source {
            Some(SourceRows::Structured { bundle }) => Some(bundle),
            _ => None,
        }
    }
}

/// Identifies one dry-run submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A dry run the wizard is waiting for
#[derive(Debug, Clone)]
pub struct PendingValidation {
    ticket: Ticket,
    drafts: Vec<ActivityDraft>,
    mapping: Option<ColumnMapping>,
    context: ValidationContext,
}

impl PendingValidation {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Run the dry run; hand the result to [`ImportWizard::resolve`]
    pub async fn run(self, coordinator: &ValidationCoordinator) -> (Ticket, ValidationOutcome) {
        let outcome = coordinator
            .validate(self.drafts, self.mapping.as_ref(), &self.context)
            .await;
        (self.ticket, outcome)
    }
}

/// What [`ImportWizard::resolve`] did with a dry-run result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied(WizardState),
    Stale,
}

pub struct ImportWizard {
    coordinator: ValidationCoordinator,
    context: ValidationContext,
    ingestor: FileIngestor,
    mapper: ColumnMapper,
    normalizer: ActivityNormalizer,
    attributor: ErrorAttributor,
    session: Arc<ImportSession>,
    generation: u64,
    pending: Option<Ticket>,
}

impl ImportWizard {
    pub fn new(coordinator: ValidationCoordinator, context: ValidationContext) -> Self {
        Self {
            coordinator,
            context,
            ingestor: FileIngestor::new(),
            mapper: ColumnMapper::new(),
            normalizer: ActivityNormalizer::new(),
            attributor: ErrorAttributor::new(),
            session: Arc::new(ImportSession::empty()),
            generation: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> WizardState {
        self.session.state
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Arc<ImportSession> {
        Arc::clone(&self.session)
    }

    pub fn coordinator(&self) -> &ValidationCoordinator {
        &self.coordinator
    }

    pub fn is_validating(&self) -> bool {
        self.pending.is_some()
    }

    fn replace(&mut self, session: ImportSession) {
        self.session = Arc::new(session);
    }

    /// Invalidate whatever dry run is in flight
    fn next_ticket(&mut self) -> Ticket {
        self.generation += 1;
        let ticket = Ticket(self.generation);
        self.pending = Some(ticket);
        ticket
    }

    fn abandon_pending(&mut self) {
        self.generation += 1;
        if self.pending.take().is_some() {
            log::debug!("Dropped the in-flight dry run");
        }
    }

    fn require(&self, state: WizardState) -> Result<()> {
        if self.session.state == state {
            Ok(())
        } else {
            Err(Error::InvalidState(self.session.state.to_string()))
        }
    }

    fn record_failure(&mut self, session: ImportSession, error: &Error) {
        let rows = session
            .source
            .as_ref()
            .map(SourceRows::attribution_rows)
            .unwrap_or_default();
        let diagnostics = self.attributor.attribute(&error.messages(), &rows);
        self.replace(ImportSession {
            summary: Some(error.summary()),
            diagnostics,
            ..session
        });
    }

    /// Start over with a new file
    ///
    /// A delimited file moves to `MapColumns` with an inferred mapping and
    /// returns `None`. A structured file stays in `SelectFile` and returns the
    /// dry run to perform. Failures are recorded on the session as well as
    /// returned.
    pub fn load_file(&mut self, file_name: &str, content: &str) -> Result<Option<PendingValidation>> {
        self.abandon_pending();

        let fresh = ImportSession {
            file_name: Some(file_name.to_string()),
            ..ImportSession::empty()
        };

        let ingested = match self.ingestor.ingest(file_name, content) {
            Ok(ingested) => ingested,
            Err(error) => {
                log::info!("Could not read '{}': {}", file_name, error);
                self.record_failure(fresh, &error);
                return Err(error);
            }
        };

        match ingested {
            Ingested::Delimited(parsed) => {
                let mapping = self.mapper.infer(&parsed.columns);
                self.replace(ImportSession {
                    state: WizardState::MapColumns,
                    columns: parsed.columns.clone(),
                    preview_rows: parsed.preview_rows,
                    mapping,
                    source: Some(SourceRows::Delimited {
                        columns: parsed.columns,
                        rows: parsed.rows,
                    }),
                    ..fresh
                });
                Ok(None)
            }
            Ingested::Structured(bundle) => {
                let session = ImportSession {
                    source: Some(SourceRows::Structured {
                        bundle: bundle.clone(),
                    }),
                    ..fresh
                };

                let drafts = match self.normalizer.from_structured_bundle(&bundle) {
                    Ok(drafts) => drafts,
                    Err(error) => {
                        self.record_failure(session, &error);
                        return Err(error);
                    }
                };

                let context = ValidationContext {
                    accounts: bundle.accounts,
                    asset_profiles: bundle.asset_profiles,
                    tags: bundle.tags,
                    user_accounts: self.context.user_accounts.clone(),
                };
                let ticket = self.next_ticket();
                self.replace(ImportSession {
                    drafts: drafts.clone(),
                    ..session
                });

                Ok(Some(PendingValidation {
                    ticket,
                    drafts,
                    mapping: None,
                    context,
                }))
            }
        }
    }

    /// Point `field` at `column` (empty clears it)
    ///
    /// Returns the field that previously used `column`, now unmapped.
    pub fn assign_column(&mut self, field: CanonicalField, column: &str) -> Result<Option<CanonicalField>> {
        self.require(WizardState::MapColumns)?;
        if !column.is_empty() && !self.session.columns.iter().any(|c| c == column) {
            return Err(Error::InvalidMapping(format!("no column named '{}'", column)));
        }

        let mut mapping = self.session.mapping.clone();
        let displaced = mapping.assign(field, column);
        self.replace(ImportSession {
            mapping,
            ..(*self.session).clone()
        });
        Ok(displaced)
    }

    /// Replace the mapping, e.g. with a saved profile
    ///
    /// Entries naming columns this file lacks are dropped; those fields are returned.
    pub fn use_mapping(&mut self, mapping: &ColumnMapping) -> Result<Vec<CanonicalField>> {
        self.require(WizardState::MapColumns)?;

        let kept = mapping.restricted_to(&self.session.columns);
        let dropped: Vec<CanonicalField> = mapping
            .iter()
            .filter(|(field, _)| kept.get(*field).is_none())
            .map(|(field, _)| field)
            .collect();
        if !dropped.is_empty() {
            log::warn!(
                "{} mapped columns are not in this file and were ignored",
                dropped.len()
            );
        }

        self.replace(ImportSession {
            mapping: kept,
            ..(*self.session).clone()
        });
        Ok(dropped)
    }

    /// Normalize the rows with the current mapping and submit them
    ///
    /// Supersedes any dry run already in flight. Fails with
    /// [`Error::MappingIncomplete`] while a required field is unmapped; the
    /// wizard stays in `MapColumns` either way.
    pub fn begin_mapping(&mut self) -> Result<PendingValidation> {
        self.require(WizardState::MapColumns)?;

        let session = self.session.cleared();
        if let Err(error) = session.mapping.ensure_complete() {
            self.abandon_pending();
            self.record_failure(session, &error);
            return Err(error);
        }

        let drafts = match &session.source {
            Some(SourceRows::Delimited { rows, .. }) => self.normalizer.from_mapping(&session.mapping, rows),
            _ => Vec::new(),
        };
        let mapping = session.mapping.clone();
        let ticket = self.next_ticket();
        self.replace(ImportSession {
            drafts: drafts.clone(),
            ..session
        });

        Ok(PendingValidation {
            ticket,
            drafts,
            mapping: Some(mapping),
            context: self.context.clone(),
        })
    }

    /// Apply a dry-run result, unless a later submission or a reset made it stale
    pub fn resolve(&mut self, ticket: Ticket, outcome: ValidationOutcome) -> Resolution {
        if self.pending != Some(ticket) {
            log::debug!("Discarding stale dry-run result");
            return Resolution::Stale;
        }
        self.pending = None;

        let session = self.session.cleared();
        match outcome {
            ValidationOutcome::Success(validated) => {
                let selection = validated
                    .activities
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| !a.has_error())
                    .map(|(i, _)| i)
                    .collect();
                self.replace(ImportSession {
                    state: WizardState::SelectActivities,
                    drafts: self.session.drafts.clone(),
                    activities: validated.activities,
                    total: validated.total,
                    selection,
                    ..session
                });
            }
            ValidationOutcome::Failure(failure) => {
                let rows = session
                    .source
                    .as_ref()
                    .map(SourceRows::attribution_rows)
                    .unwrap_or_default();
                let diagnostics = self.attributor.attribute(&failure.messages, &rows);
                self.replace(ImportSession {
                    drafts: self.session.drafts.clone(),
                    summary: Some(failure.summary),
                    diagnostics,
                    ..session
                });
            }
        }

        Resolution::Applied(self.session.state)
    }

    /// Load a file and, for structured files, run the dry run to completion
    pub async fn open_file(&mut self, file_name: &str, content: &str) -> Result<WizardState> {
        if let Some(pending) = self.load_file(file_name, content)? {
            let (ticket, outcome) = pending.run(&self.coordinator).await;
            self.resolve(ticket, outcome);
        }
        Ok(self.state())
    }

    /// Submit the current mapping and wait for the dry run
    pub async fn apply_mapping(&mut self) -> Result<WizardState> {
        let pending = self.begin_mapping()?;
        let (ticket, outcome) = pending.run(&self.coordinator).await;
        self.resolve(ticket, outcome);
        Ok(self.state())
    }

    /// Narrow the selection to `indices`
    ///
    /// Out-of-range and error-marked activities are skipped. Returns how many
    /// activities are now selected.
    pub fn select(&mut self, indices: impl IntoIterator<Item = usize>) -> Result<usize> {
        self.require(WizardState::SelectActivities)?;

        let activities = &self.session.activities;
        let selection: BTreeSet<usize> = indices
            .into_iter()
            .filter(|i| activities.get(*i).is_some_and(|a| !a.has_error()))
            .collect();
        let count = selection.len();

        self.replace(ImportSession {
            selection,
            ..(*self.session).clone()
        });
        Ok(count)
    }

    /// Selected activities, in display order
    pub fn selected_activities(&self) -> Vec<ActivityDraft> {
        self.session
            .selection
            .iter()
            .filter_map(|i| self.session.activities.get(*i))
            .cloned()
            .collect()
    }

    /// Import the selected activities and start over
    ///
    /// The session is consumed whether or not the import succeeds.
    pub async fn commit(&mut self, importer: &dyn ActivityImporter) -> Result<usize> {
        self.require(WizardState::SelectActivities)?;

        let activities = self.selected_activities();
        if activities.is_empty() {
            return Err(Error::InvalidState("no activities are selected".to_string()));
        }

        let bundle = self.session.bundle().cloned().unwrap_or_default();
        let request = ImportRequest {
            accounts: bundle.accounts,
            activities,
            asset_profiles: bundle.asset_profiles,
            tags: bundle.tags,
        };
        let count = request.activities.len();

        self.abandon_pending();
        self.replace(ImportSession::empty());

        importer.import(&request).await?;
        log::info!("Imported {} activities", count);
        Ok(count)
    }

    /// Discard results; a delimited file goes back to mapping, anything else to file selection
    pub fn reset(&mut self) -> WizardState {
        self.abandon_pending();

        let next = match &self.session.source {
            Some(source) if source.is_delimited() => ImportSession {
                state: WizardState::MapColumns,
                ..self.session.cleared()
            },
            _ => ImportSession::empty(),
        };
        self.replace(next);
        self.state()
    }

    /// Leave the mapping step and drop the file
    pub fn back_to_file_selection(&mut self) -> Result<()> {
        self.require(WizardState::MapColumns)?;
        self.abandon_pending();
        self.replace(ImportSession::empty());
        Ok(())
    }
}
