//! Integration tests for the import pipeline
//!
//! The import API is replaced at the trait level by scripted oracles; file
//! parsing, mapping, normalization, attribution and the wizard are real.
//!
//! Run with: cargo test --test import_pipeline_test -- --nocapture

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;
use tokio::sync::Notify;

use activity_import_core::config::Config;
use activity_import_core::domain::result::{Error, Result, SchemaError};
use activity_import_core::domain::{ActivityDraft, CanonicalField, ColumnMapping};
use activity_import_core::ports::{
    ActivityImporter, DryRunRequest, DryRunResponse, ImportRequest, ValidationContext,
    ValidationOracle,
};
use activity_import_core::services::{
    read_file, ActivityNormalizer, ColumnMapper, ErrorAttributor, FileIngestor, ImportWizard,
    Ingested, Resolution, ValidationCoordinator, WizardState,
};
use activity_import_core::ImportContext;

// ============================================================================
// Test Helpers
// ============================================================================

const BROKER_CSV: &str = "Trade Date,Action,Ticker,Shares,Trade Price,IB Commission,CCY,Notes\n\
    2024-01-02,BUY,VTI,3,220.10,1.00,USD,first\n\
    2024-01-09,BUY,BND,-2,71.50,1.00,USD,\n\
    2024-02-01,SELL,VTI,1,230.00,1.00,USD,rebalance\n";

/// Oracle that behaves like a strict import API
///
/// Rejects any draft whose quantity starts with '-', pointing at its index;
/// otherwise accepts every draft and flags symbols listed as duplicates.
struct StrictOracle {
    duplicates: Vec<&'static str>,
    requests: Mutex<Vec<DryRunRequest>>,
}

impl StrictOracle {
    fn new() -> Arc<Self> {
        Self::with_duplicates(Vec::new())
    }

    fn with_duplicates(duplicates: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            duplicates,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ValidationOracle for StrictOracle {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<DryRunResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let problems: Vec<String> = request
            .activities
            .iter()
            .enumerate()
            .filter(|(_, a)| a.display(CanonicalField::Quantity).starts_with('-'))
            .map(|(i, _)| format!("activities.{}.quantity must be a positive number", i))
            .collect();
        if !problems.is_empty() {
            return Err(Error::Validation(problems));
        }

        let activities = request
            .activities
            .iter()
            .cloned()
            .map(|mut a| {
                if self.duplicates.contains(&a.display(CanonicalField::Symbol).as_str()) {
                    a.error = Some(json!({"code": "IS_DUPLICATE"}));
                }
                a
            })
            .collect();
        Ok(DryRunResponse { activities })
    }
}

/// Oracle that holds every dry run until released
struct GatedOracle {
    gate: Notify,
}

#[async_trait]
impl ValidationOracle for GatedOracle {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<DryRunResponse> {
        self.gate.notified().await;
        Ok(DryRunResponse {
            activities: request.activities.clone(),
        })
    }
}

#[derive(Default)]
struct RecordingImporter {
    requests: Mutex<Vec<ImportRequest>>,
}

#[async_trait]
impl ActivityImporter for RecordingImporter {
    async fn import(&self, request: &ImportRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

fn wizard_with(oracle: Arc<dyn ValidationOracle>) -> ImportWizard {
    ImportWizard::new(ValidationCoordinator::new(oracle), ValidationContext::default())
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Column Inference Tests
// ============================================================================

#[test]
fn test_inference_is_deterministic() {
    let sample = headers(&["Trade Date", "Action", "Ticker", "Shares", "Trade Price", "Value"]);
    let first = ColumnMapper::new().infer(&sample);

    for _ in 0..20 {
        assert_eq!(ColumnMapper::new().infer(&sample), first);
    }
}

#[test]
fn test_no_column_is_assigned_twice() {
    // Headers crafted so several fields could claim the same column
    let samples = [
        headers(&["date type", "type", "symbol code", "code"]),
        headers(&["price value", "value", "fee", "commission fee"]),
        headers(&["account id", "accountid", "note", "comment note"]),
        headers(&["", "", "date"]),
    ];

    for sample in &samples {
        let mapping = ColumnMapper::new().infer(sample);
        let mut columns: Vec<&str> = mapping.iter().map(|(_, c)| c).collect();
        let before = columns.len();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), before, "column reused for {:?}", sample);
    }
}

#[test]
fn test_unit_price_prefers_earlier_header() {
    let mapping = ColumnMapper::new().infer(&headers(&["price", "value"]));
    assert_eq!(mapping.get(CanonicalField::UnitPrice), Some("price"));
}

#[test]
fn test_canonical_csv_maps_every_field_to_itself() {
    let header_line: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.key()).collect();
    let content = format!("{}\n", header_line.join(","));

    let Ingested::Delimited(parsed) = FileIngestor::new().ingest("canonical.csv", &content).unwrap() else {
        panic!("expected delimited result");
    };
    let mapping = ColumnMapper::new().infer(&parsed.columns);

    for field in CanonicalField::ALL {
        assert_eq!(mapping.get(field), Some(field.key()));
    }
}

// ============================================================================
// Ingestion and Normalization Tests
// ============================================================================

#[test]
fn test_legacy_orders_yields_rename_hint() {
    let err = FileIngestor::new()
        .ingest("export.json", r#"{"orders": [{"symbol": "MSFT"}]}"#)
        .unwrap_err();

    assert!(matches!(err, Error::Schema(SchemaError::LegacyOrders)));
    assert_eq!(err.messages(), vec!["orders needs to be renamed to activities"]);
}

#[test]
fn test_normalization_is_idempotent() {
    let Ingested::Delimited(parsed) = FileIngestor::new().ingest("broker.csv", BROKER_CSV).unwrap() else {
        panic!("expected delimited result");
    };
    let mapping = ColumnMapper::new().infer(&parsed.columns);
    let normalizer = ActivityNormalizer::new();

    let first = normalizer.from_mapping(&mapping, &parsed.rows);
    let second = normalizer.from_mapping(&mapping, &parsed.rows);

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(first[1].symbol, Some(json!("BND")));
}

#[tokio::test]
async fn test_read_file_with_bom() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Broker.CSV");
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(BROKER_CSV.as_bytes());
    std::fs::write(&path, bytes).unwrap();

    let (name, content) = read_file(&path).await.unwrap();
    let Ingested::Delimited(parsed) = FileIngestor::new().ingest(&name, &content).unwrap() else {
        panic!("expected delimited result");
    };

    assert_eq!(parsed.columns[0], "Trade Date");
}

// ============================================================================
// Attribution Tests
// ============================================================================

#[test]
fn test_attribution_resolves_located_messages_only() {
    let rows: Vec<JsonValue> = vec![json!({"symbol": "A"}), json!({"symbol": "B"}), json!({"symbol": "C"})];
    let messages = vec![
        "activities.2.quantity must be positive".to_string(),
        "unexpected global error".to_string(),
    ];

    let diagnostics = ErrorAttributor::new().attribute(&messages, &rows);

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].message, messages[0]);
    assert_eq!(diagnostics[0].source_row, Some(json!({"symbol": "C"})));
    assert_eq!(diagnostics[1].message, messages[1]);
    assert_eq!(diagnostics[1].source_row, None);
}

// ============================================================================
// Wizard Flow Tests
// ============================================================================

#[tokio::test]
async fn test_csv_rejection_then_fix_then_commit() {
    let oracle = StrictOracle::new();
    let mut wizard = wizard_with(oracle.clone());

    assert_eq!(wizard.open_file("broker.csv", BROKER_CSV).await.unwrap(), WizardState::MapColumns);
    let session = wizard.session();
    assert_eq!(session.mapping.get(CanonicalField::Quantity), Some("Shares"));
    assert_eq!(session.mapping.get(CanonicalField::Comment), Some("Notes"));

    // Row 1 has a negative quantity
    assert_eq!(wizard.apply_mapping().await.unwrap(), WizardState::MapColumns);
    let session = wizard.session();
    assert_eq!(
        session.summary.as_deref(),
        Some("activities.1.quantity must be a positive number")
    );
    assert_eq!(session.diagnostics.len(), 1);
    assert_eq!(session.diagnostics[0].source_row.as_ref().unwrap()["Ticker"], "BND");

    // The dry run always carried the mapping and the dry-run flag
    {
        let requests = oracle.requests.lock().unwrap();
        assert!(requests[0].is_dry_run());
        assert_eq!(requests[0].column_mapping.as_ref(), Some(&session.mapping));
    }

    // Swapping quantity and price moves the negative value out of quantity
    assert_eq!(
        wizard.assign_column(CanonicalField::UnitPrice, "Shares").unwrap(),
        Some(CanonicalField::Quantity)
    );
    assert_eq!(wizard.assign_column(CanonicalField::Quantity, "Trade Price").unwrap(), None);
    assert_eq!(wizard.apply_mapping().await.unwrap(), WizardState::SelectActivities);

    let session = wizard.session();
    assert!(session.diagnostics.is_empty());
    assert_eq!(session.total, 3);
    // Most recent first
    assert_eq!(session.activities[0].date, Some(json!("2024-02-01")));

    let importer = RecordingImporter::default();
    assert_eq!(wizard.commit(&importer).await.unwrap(), 3);
    assert_eq!(wizard.state(), WizardState::SelectFile);
    assert_eq!(importer.requests.lock().unwrap()[0].activities.len(), 3);
}

#[tokio::test]
async fn test_json_import_skips_flagged_activities() {
    let mut wizard = wizard_with(StrictOracle::with_duplicates(vec!["AAPL"]));
    let content = r#"{
        "accounts": [{"id": "acc-1", "name": "Broker"}],
        "activities": [
            {"id": "a", "date": "2024-01-01", "symbol": "MSFT", "quantity": 1},
            {"id": "b", "date": "2024-01-02", "symbol": "AAPL", "quantity": 2}
        ],
        "tags": [{"id": "t1", "name": "retirement"}]
    }"#;

    assert_eq!(wizard.open_file("export.json", content).await.unwrap(), WizardState::SelectActivities);
    assert_eq!(wizard.selected_activities().len(), 1);
    assert_eq!(wizard.selected_activities()[0].symbol, Some(json!("MSFT")));

    // Flagged activity cannot be selected
    assert_eq!(wizard.select([0, 1]).unwrap(), 1);

    let importer = RecordingImporter::default();
    wizard.commit(&importer).await.unwrap();
    let requests = importer.requests.lock().unwrap();
    assert_eq!(requests[0].accounts.len(), 1);
    assert_eq!(requests[0].tags.len(), 1);
    assert!(requests[0].activities[0].extra.get("id").is_none());
}

#[tokio::test]
async fn test_json_rejection_attributes_file_rows() {
    let mut wizard = wizard_with(StrictOracle::new());
    let content = r#"{"activities": [{"symbol": "A", "quantity": 1}, {"symbol": "B", "quantity": "-3"}]}"#;

    assert_eq!(wizard.open_file("export.json", content).await.unwrap(), WizardState::SelectFile);
    let session = wizard.session();
    assert_eq!(session.diagnostics.len(), 1);
    assert_eq!(session.diagnostics[0].source_row, Some(json!({"symbol": "B", "quantity": "-3"})));
}

#[tokio::test]
async fn test_reset_discards_in_flight_dry_run() {
    let oracle = Arc::new(GatedOracle { gate: Notify::new() });
    let mut wizard = wizard_with(oracle.clone());
    wizard.load_file("broker.csv", BROKER_CSV).unwrap();

    let pending = wizard.begin_mapping().unwrap();
    let coordinator = wizard.coordinator().clone();
    let in_flight = tokio::spawn(async move { pending.run(&coordinator).await });
    tokio::task::yield_now().await;

    assert_eq!(wizard.reset(), WizardState::MapColumns);
    let before = wizard.session();

    oracle.gate.notify_one();
    let (ticket, outcome) = in_flight.await.unwrap();
    assert!(outcome.is_success());

    assert_eq!(wizard.resolve(ticket, outcome), Resolution::Stale);
    assert_eq!(wizard.state(), WizardState::MapColumns);
    assert!(Arc::ptr_eq(&before, &wizard.session()));
    assert!(!wizard.is_validating());
}

#[tokio::test]
async fn test_new_file_discards_previous_session() {
    let mut wizard = wizard_with(StrictOracle::new());
    wizard.load_file("broker.csv", BROKER_CSV).unwrap();
    let stale = wizard.begin_mapping().unwrap();
    let first_id = wizard.session().id;

    wizard.load_file("other.csv", "Symbol,Date\nVTI,2024-01-01\n").unwrap();

    let session = wizard.session();
    assert_ne!(session.id, first_id);
    assert_eq!(session.file_name.as_deref(), Some("other.csv"));
    assert_eq!(session.columns, vec!["Symbol", "Date"]);

    let (ticket, outcome) = stale.run(wizard.coordinator()).await;
    assert_eq!(wizard.resolve(ticket, outcome), Resolution::Stale);
}

#[tokio::test]
async fn test_profile_round_trip_through_config() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::load_file(dir.path()).unwrap();
    let mut profile = ColumnMapping::new();
    profile.assign(CanonicalField::Date, "Trade Date");
    profile.assign(CanonicalField::Account, "Account Name");
    config.save_profile("ibkr", profile);
    config.save(dir.path()).unwrap();

    let reloaded = Config::load_file(dir.path()).unwrap();
    let mut wizard = wizard_with(StrictOracle::new());
    wizard.load_file("broker.csv", BROKER_CSV).unwrap();

    let dropped = wizard
        .use_mapping(&reloaded.profile("ibkr").unwrap().column_mapping)
        .unwrap();

    assert_eq!(dropped, vec![CanonicalField::Account]);
    assert_eq!(wizard.session().mapping.get(CanonicalField::Date), Some("Trade Date"));
    assert!(matches!(wizard.begin_mapping(), Err(Error::MappingIncomplete { .. })));
}

#[tokio::test]
async fn test_dry_run_carries_configured_accounts() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"accounts": [{"id": "acc-1", "name": "Brokerage", "currency": "USD"}]}"#,
    )
    .unwrap();
    let config = Config::load_file(dir.path()).unwrap();
    let oracle = StrictOracle::new();
    let context = ImportContext::with_ports(
        config,
        dir.path().to_path_buf(),
        oracle.clone(),
        Arc::new(RecordingImporter::default()),
    );

    let csv = "Date,Account,Type,Symbol,Quantity,UnitPrice,Fee,Currency\n\
        2024-01-02,Brokerage,BUY,VTI,3,220.10,1.00,USD\n";
    let mut wizard = context.wizard();
    wizard.open_file("accounts.csv", csv).await.unwrap();
    assert_eq!(wizard.session().mapping.get(CanonicalField::Account), Some("Account"));
    assert_eq!(wizard.apply_mapping().await.unwrap(), WizardState::SelectActivities);

    let requests = oracle.requests.lock().unwrap();
    assert_eq!(
        requests[0].context.user_accounts,
        vec![json!({"id": "acc-1", "name": "Brokerage", "currency": "USD"})]
    );
    assert_eq!(requests[0].activities[0].account, Some(json!("Brokerage")));
}

#[tokio::test]
async fn test_offline_context_accepts_everything() {
    let dir = TempDir::new().unwrap();
    let context = ImportContext::new(dir.path(), true).unwrap();
    let mut wizard = context.wizard();

    wizard.open_file("broker.csv", BROKER_CSV).await.unwrap();
    assert_eq!(wizard.apply_mapping().await.unwrap(), WizardState::SelectActivities);

    let drafts: Vec<ActivityDraft> = wizard.selected_activities();
    assert_eq!(drafts.len(), 3);
    assert_eq!(context.importer().import(&ImportRequest::default()).await.ok(), Some(()));
}
