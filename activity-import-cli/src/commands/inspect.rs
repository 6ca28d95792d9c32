//! Inspect command - show a file's contents and the inferred column mapping
//!
//! Works entirely offline: nothing is validated.

use std::path::Path;

use anyhow::{anyhow, Result};
use colored::Colorize;
use serde_json::json;

use activity_import_core::services::{ColumnMapper, FileIngestor, Ingested};

use super::load;
use crate::output;

pub async fn run(file: &Path, json: bool) -> Result<()> {
    let (file_name, content) = load(file).await?;

    let ingested = FileIngestor::new()
        .ingest(&file_name, &content)
        .map_err(|e| anyhow!(e.summary()))?;
    let kind = ingested.kind();

    match ingested {
        Ingested::Delimited(parsed) => {
            let mapping = ColumnMapper::new().infer(&parsed.columns);
            let missing = mapping.missing_required();

            if json {
                let value = json!({
                    "fileName": file_name,
                    "kind": kind,
                    "columns": parsed.columns,
                    "rowCount": parsed.rows.len(),
                    "previewRows": parsed.preview_rows,
                    "mapping": mapping,
                    "missingRequired": missing,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            output::info(&format!("{}: delimited text, {} rows", file_name, parsed.rows.len()));
            println!();
            if parsed.columns.is_empty() {
                output::warning("No header row found");
                return Ok(());
            }

            println!("{}", "Preview:".bold());
            println!("{}", output::rows_table(&parsed.columns, &parsed.preview_rows));
            output::truncation_note(parsed.preview_rows.len(), parsed.rows.len());
            println!();

            println!("{}", "Inferred mapping (* required):".bold());
            println!("{}", output::mapping_table(&mapping));

            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|f| f.key()).collect();
                output::warning(&format!(
                    "Map the missing fields with --map, e.g. --map {}=\"Column name\"",
                    names[0]
                ));
            }
        }
        Ingested::Structured(bundle) => {
            if json {
                let value = json!({
                    "fileName": file_name,
                    "kind": kind,
                    "accounts": bundle.accounts.len(),
                    "activities": bundle.activities.len(),
                    "assetProfiles": bundle.asset_profiles.len(),
                    "tags": bundle.tags.len(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            output::info(&format!("{}: structured export", file_name));
            let mut table = output::create_table();
            table.set_header(vec!["Section", "Entries"]);
            table.add_row(vec!["accounts".to_string(), bundle.accounts.len().to_string()]);
            table.add_row(vec!["activities".to_string(), bundle.activities.len().to_string()]);
            table.add_row(vec!["assetProfiles".to_string(), bundle.asset_profiles.len().to_string()]);
            table.add_row(vec!["tags".to_string(), bundle.tags.len().to_string()]);
            println!("{}", table);
        }
    }

    Ok(())
}
