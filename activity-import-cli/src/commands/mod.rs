//! CLI command implementations

pub mod check;
pub mod import;
pub mod inspect;
pub mod profiles;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use activity_import_core::services::{read_file, ImportSession};
use activity_import_core::{CanonicalField, ImportContext};

use crate::output;

/// Get the app directory from environment or default
pub fn get_app_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("AIMP_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory; set AIMP_DIR")?;
    Ok(home.join(".activity-import"))
}

/// Get the import context, talking to the import API unless `offline`
pub fn get_context(offline: bool) -> Result<ImportContext> {
    let app_dir = get_app_dir()?;
    tracing::debug!(app_dir = %app_dir.display(), offline, "Loading import context");
    ImportContext::new(&app_dir, offline).context("Failed to initialize import context")
}

/// Read a file from disk, returning its name and decoded text
pub async fn load(path: &Path) -> Result<(String, String)> {
    read_file(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse `field=column` from the command line
pub fn parse_mapping(arg: &str) -> std::result::Result<(CanonicalField, String), String> {
    let (field, column) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=COLUMN, got '{}'", arg))?;
    let field = field.trim().parse::<CanonicalField>().map_err(|e| e.to_string())?;
    Ok((field, column.to_string()))
}

/// Print the summary line and the diagnostics table of a failed step
pub fn print_failure(session: &ImportSession) {
    if let Some(summary) = &session.summary {
        output::error(summary);
    }
    if session.diagnostics.is_empty() {
        return;
    }
    // A lone message already shown as the summary needs no table
    if session.diagnostics.len() == 1 && session.diagnostics[0].source_row.is_none() {
        return;
    }

    println!();
    println!("{}", output::diagnostics_table(&session.diagnostics));
    output::truncation_note(output::MAX_TABLE_ROWS, session.diagnostics.len());
    if session.diagnostics.iter().any(|d| d.source_row.is_some()) {
        println!("{}", "Source rows are shown as read from the file.".dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        assert_eq!(
            parse_mapping("unitPrice=Trade Price").unwrap(),
            (CanonicalField::UnitPrice, "Trade Price".to_string())
        );
        assert_eq!(
            parse_mapping("fee=").unwrap(),
            (CanonicalField::Fee, String::new())
        );
        assert!(parse_mapping("price").is_err());
        assert!(parse_mapping("nonsense=Col").is_err());
    }
}
