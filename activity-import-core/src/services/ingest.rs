//! File ingestion - detect the file kind and parse it
//!
//! Delimited text (`.csv`) yields headers plus rows keyed by header.
//! Structured objects (`.json`) yield an import bundle whose activities have
//! had their identity fields removed.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, Terminator};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::domain::result::{Error, Result, SchemaError, UNEXPECTED_FORMAT};
use crate::domain::{strip_identity, RawDataRow, StructuredImportBundle};

/// Number of parsed rows kept for display while mapping columns
pub const PREVIEW_ROW_LIMIT: usize = 5;

/// File kind, decided by extension alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    Delimited,
    Structured,
}

impl FileKind {
    /// Case-insensitive `.csv` or `.json`; anything else is a format error
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(FileKind::Delimited),
            Some("json") => Ok(FileKind::Structured),
            _ => {
                log::debug!("Unsupported file extension: {:?}", extension);
                Err(Error::format(UNEXPECTED_FORMAT))
            }
        }
    }
}

/// Parsed delimited-text file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelimitedResult {
    /// Non-empty headers, in file order, made unique
    pub columns: Vec<String>,
    /// First rows, for display
    pub preview_rows: Vec<RawDataRow>,
    /// Every data row
    #[serde(skip)]
    pub rows: Vec<RawDataRow>,
    pub full_parse_available: bool,
}

/// Outcome of ingesting one file
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    Delimited(DelimitedResult),
    Structured(StructuredImportBundle),
}

impl Ingested {
    pub fn kind(&self) -> FileKind {
        match self {
            Ingested::Delimited(_) => FileKind::Delimited,
            Ingested::Structured(_) => FileKind::Structured,
        }
    }
}

/// File ingestor
#[derive(Debug, Clone)]
pub struct FileIngestor {
    preview_limit: usize,
}

impl Default for FileIngestor {
    fn default() -> Self {
        Self {
            preview_limit: PREVIEW_ROW_LIMIT,
        }
    }
}

impl FileIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest already-decoded file content
    pub fn ingest(&self, file_name: &str, content: &str) -> Result<Ingested> {
        let kind = FileKind::from_file_name(file_name)?;
        log::debug!("Ingesting '{}' as {:?}", file_name, kind);

        match kind {
            FileKind::Delimited => self.ingest_delimited(content).map(Ingested::Delimited),
            FileKind::Structured => ingest_structured(content).map(Ingested::Structured),
        }
    }

    fn ingest_delimited(&self, content: &str) -> Result<DelimitedResult> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // Header row handled here so empty names can be dropped
            .flexible(true)
            .terminator(Terminator::CRLF)
            .from_reader(content.as_bytes());

        let mut columns: Option<Vec<Option<String>>> = None;
        let mut rows = Vec::new();

        // Blank lines never reach here; the csv reader skips them. A row of
        // empty cells (",,") is data and is kept.
        for record in reader.records() {
            // A str source with flexible records yields no read errors
            let record = record.map_err(|e| Error::format(e.to_string()))?;

            match &columns {
                None => columns = Some(unique_headers(record.iter())),
                Some(headers) => {
                    if record.len() > headers.len() {
                        log::debug!(
                            "Row {} has {} fields, expected {}; extra fields ignored",
                            rows.len() + 1,
                            record.len(),
                            headers.len()
                        );
                    }
                    let row: RawDataRow = headers
                        .iter()
                        .zip(record.iter())
                        .filter_map(|(header, value)| {
                            header.as_ref().map(|h| (h.clone(), value.to_string()))
                        })
                        .collect();
                    rows.push(row);
                }
            }
        }

        let columns: Vec<String> = columns.unwrap_or_default().into_iter().flatten().collect();
        let preview_rows = rows.iter().take(self.preview_limit).cloned().collect();

        log::info!("Parsed {} columns and {} rows", columns.len(), rows.len());

        Ok(DelimitedResult {
            columns,
            preview_rows,
            rows,
            full_parse_available: true,
        })
    }
}

/// Read a file and decode it as UTF-8
///
/// Returns the file name (for kind detection) and the text. A UTF-8 BOM is
/// dropped; invalid sequences are replaced rather than rejected.
pub async fn read_file(path: &Path) -> Result<(String, String)> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((file_name, decode_content(&bytes)))
}

/// Decode bytes as UTF-8, dropping a BOM and replacing invalid sequences
pub fn decode_content(content: &[u8]) -> String {
    let content = content.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(content);

    match std::str::from_utf8(content) {
        Ok(s) => s.to_string(),
        Err(e) => {
            log::warn!(
                "Invalid UTF-8 at byte {}; some characters were replaced",
                e.valid_up_to()
            );
            String::from_utf8_lossy(content).into_owned()
        }
    }
}

/// Header names with empties dropped (`None`) and repeats suffixed `_1`, `_2`, ...
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<Option<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut taken: Vec<String> = Vec::new();
    let mut headers = Vec::new();

    for name in raw {
        if name.is_empty() {
            headers.push(None);
            continue;
        }

        let mut candidate = name.to_string();
        if taken.contains(&candidate) {
            let count = seen.entry(name.to_string()).or_insert(0);
            loop {
                *count += 1;
                candidate = format!("{}_{}", name, count);
                if !taken.contains(&candidate) {
                    break;
                }
            }
        }

        taken.push(candidate.clone());
        headers.push(Some(candidate));
    }

    headers
}

fn ingest_structured(content: &str) -> Result<StructuredImportBundle> {
    let root: JsonValue = serde_json::from_str(content).map_err(|e| {
        log::debug!("Structured file did not parse: {}", e);
        Error::format(UNEXPECTED_FORMAT)
    })?;

    let JsonValue::Object(mut root) = root else {
        return Err(SchemaError::MissingActivities.into());
    };

    let mut activities = match root.remove("activities") {
        Some(JsonValue::Array(activities)) => activities,
        _ => {
            if matches!(root.get("orders"), Some(JsonValue::Array(_))) {
                log::info!("Structured file uses the legacy 'orders' key");
                return Err(SchemaError::LegacyOrders.into());
            }
            return Err(SchemaError::MissingActivities.into());
        }
    };

    for activity in &mut activities {
        strip_identity(activity);
    }

    Ok(StructuredImportBundle {
        accounts: array_section(&mut root, "accounts"),
        activities,
        asset_profiles: array_section(&mut root, "assetProfiles"),
        tags: array_section(&mut root, "tags"),
    })
}

fn array_section(root: &mut Map<String, JsonValue>, key: &str) -> Vec<JsonValue> {
    match root.remove(key) {
        Some(JsonValue::Array(items)) => items,
        None | Some(JsonValue::Null) => Vec::new(),
        Some(_) => {
            log::warn!("Ignoring '{}': expected a list", key);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delimited(content: &str) -> DelimitedResult {
        match FileIngestor::new().ingest("trades.csv", content).unwrap() {
            Ingested::Delimited(result) => result,
            other => panic!("expected delimited, got {:?}", other),
        }
    }

    fn structured(content: &str) -> Result<StructuredImportBundle> {
        FileIngestor::new()
            .ingest("export.json", content)
            .map(|ingested| match ingested {
                Ingested::Structured(bundle) => bundle,
                other => panic!("expected structured, got {:?}", other),
            })
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_file_name("a.CSV").unwrap(), FileKind::Delimited);
        assert_eq!(FileKind::from_file_name("dir/b.Json").unwrap(), FileKind::Structured);
        assert!(matches!(FileKind::from_file_name("c.xlsx"), Err(Error::Format(_))));
        assert!(FileKind::from_file_name("csv").is_err());
    }

    #[test]
    fn test_parse_simple_csv() {
        let result = delimited("Date,Symbol,Qty\n2024-01-02,VTI,3\n2024-01-03,BND,4\n");

        assert_eq!(result.columns, vec!["Date", "Symbol", "Qty"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["Symbol"], "VTI");
        assert_eq!(result.rows[1]["Qty"], "4");
        assert!(result.full_parse_available);
    }

    #[test]
    fn test_preview_keeps_first_five_rows() {
        let mut content = String::from("Symbol\n");
        for i in 0..8 {
            content.push_str(&format!("S{}\n", i));
        }
        let result = delimited(&content);

        assert_eq!(result.rows.len(), 8);
        assert_eq!(result.preview_rows.len(), 5);
        assert_eq!(result.preview_rows[4]["Symbol"], "S4");
    }

    #[test]
    fn test_skips_empty_lines() {
        let result = delimited("Symbol,Qty\r\n\r\nVTI,1\r\n\r\nBND,2\r\n");
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_keeps_rows_of_empty_cells() {
        let result = delimited("Symbol,Qty\n,\nVTI,1\n");

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["Symbol"], "");
        assert_eq!(result.rows[0]["Qty"], "");
        assert_eq!(result.rows[1]["Symbol"], "VTI");
        assert_eq!(result.preview_rows.len(), 2);
    }

    #[test]
    fn test_missing_values_are_absent() {
        let result = delimited("Symbol,Qty,Fee\nVTI,1\n");
        assert_eq!(result.rows[0].get("Qty").map(String::as_str), Some("1"));
        assert!(result.rows[0].get("Fee").is_none());
    }

    #[test]
    fn test_empty_and_duplicate_headers() {
        let result = delimited("Date,,Price,Price\n2024-01-02,x,1,2\n");

        assert_eq!(result.columns, vec!["Date", "Price", "Price_1"]);
        assert_eq!(result.rows[0]["Price"], "1");
        assert_eq!(result.rows[0]["Price_1"], "2");
        assert_eq!(result.rows[0].len(), 3);
    }

    #[test]
    fn test_quoted_fields() {
        let result = delimited("Symbol,Comment\nVTI,\"Hello, World\"\n");
        assert_eq!(result.rows[0]["Comment"], "Hello, World");
    }

    #[test]
    fn test_empty_csv_has_no_columns() {
        let result = delimited("");
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_decode_strips_bom() {
        let decoded = decode_content(b"\xEF\xBB\xBFDate,Symbol\n");
        assert_eq!(decoded, "Date,Symbol\n");
        let lossy = decode_content(b"Sym\xFFbol");
        assert!(lossy.starts_with("Sym"));
    }

    #[test]
    fn test_structured_strips_identity() {
        let bundle = structured(
            r#"{
                "accounts": [{"id": "acc-1", "name": "Broker"}],
                "activities": [
                    {"id": "1f2e", "symbol": "MSFT", "quantity": 2},
                    {"symbol": "AAPL"}
                ],
                "tags": []
            }"#,
        )
        .unwrap();

        assert_eq!(bundle.activities[0], json!({"symbol": "MSFT", "quantity": 2}));
        assert_eq!(bundle.activities[1], json!({"symbol": "AAPL"}));
        // Only activities lose their identity; accounts are referenced by id
        assert_eq!(bundle.accounts[0]["id"], "acc-1");
        assert!(bundle.asset_profiles.is_empty());
    }

    #[test]
    fn test_structured_legacy_orders() {
        let err = structured(r#"{"orders": [{"symbol": "MSFT"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::LegacyOrders)));
        assert_eq!(err.messages(), vec!["orders needs to be renamed to activities"]);
    }

    #[test]
    fn test_structured_without_activities() {
        let err = structured(r#"{"accounts": []}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::MissingActivities)));
        assert_eq!(err.summary(), UNEXPECTED_FORMAT);

        // orders that is not a list is no migration hint
        let err = structured(r#"{"orders": "yes"}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::MissingActivities)));

        let err = structured(r#"{"activities": {"0": {}}}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::MissingActivities)));
    }

    #[test]
    fn test_structured_parse_failure_is_generic() {
        let err = structured("{not json").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert_eq!(err.summary(), UNEXPECTED_FORMAT);
    }

    #[tokio::test]
    async fn test_read_file_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        std::fs::write(&path, b"\xEF\xBB\xBFSymbol\nVTI\n").unwrap();

        let (name, content) = read_file(&path).await.unwrap();
        assert_eq!(name, "trades.csv");
        assert_eq!(content, "Symbol\nVTI\n");
    }
}
