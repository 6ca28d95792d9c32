//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde_json::Value as JsonValue;

use activity_import_core::domain::{display_value, ActivityDraft, CanonicalField, ColumnMapping, RawDataRow};
use activity_import_core::services::ImportSession;
use activity_import_core::Diagnostic;

/// Rows shown before the table is cut short
pub const MAX_TABLE_ROWS: usize = 50;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Canonical fields with the column feeding each; required fields are starred
pub fn mapping_table(mapping: &ColumnMapping) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Field", "Column", "Hint"]);

    for field in CanonicalField::ALL {
        let label = if field.is_required() {
            format!("{} *", field.label())
        } else {
            field.label().to_string()
        };
        let column = match mapping.get(field) {
            Some(column) => Cell::new(column),
            None if field.is_required() => Cell::new("missing").fg(Color::Red),
            None => Cell::new("-"),
        };
        table.add_row(vec![Cell::new(label), column, Cell::new(field.hint().unwrap_or(""))]);
    }
    table
}

/// Raw rows under their original headers
pub fn rows_table(columns: &[String], rows: &[RawDataRow]) -> Table {
    let mut table = create_table();
    table.set_header(columns.to_vec());
    for row in rows {
        let cells: Vec<&str> = columns
            .iter()
            .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
            .collect();
        table.add_row(cells);
    }
    table
}

/// Validated activities in display order, marking what would be imported
pub fn activities_table(session: &ImportSession) -> Table {
    let fields = [
        CanonicalField::Date,
        CanonicalField::Type,
        CanonicalField::Symbol,
        CanonicalField::Quantity,
        CanonicalField::UnitPrice,
        CanonicalField::Fee,
        CanonicalField::Currency,
        CanonicalField::Account,
    ];

    let mut table = create_table();
    let mut header = vec!["#".to_string()];
    header.extend(fields.iter().map(|f| f.label().to_string()));
    header.push("Status".to_string());
    table.set_header(header);

    for (index, activity) in session.activities.iter().enumerate().take(MAX_TABLE_ROWS) {
        let mut row = vec![Cell::new(index)];
        row.extend(fields.iter().map(|f| Cell::new(activity.display(*f))));
        row.push(status_cell(activity, session.selection.contains(&index)));
        table.add_row(row);
    }
    table
}

fn status_cell(activity: &ActivityDraft, selected: bool) -> Cell {
    if activity.has_error() {
        let reason = match &activity.error {
            Some(JsonValue::Object(error)) => error
                .get("code")
                .or_else(|| error.get("message"))
                .map(display_value)
                .unwrap_or_else(|| "error".to_string()),
            Some(other) => display_value(other),
            None => String::new(),
        };
        Cell::new(reason).fg(Color::Yellow)
    } else if selected {
        Cell::new("import").fg(Color::Green)
    } else {
        Cell::new("skip")
    }
}

/// One row per message, with the source record it points at when known
pub fn diagnostics_table(diagnostics: &[Diagnostic]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Message", "Source row"]);
    for diagnostic in diagnostics.iter().take(MAX_TABLE_ROWS) {
        let source = diagnostic
            .source_row
            .as_ref()
            .map(JsonValue::to_string)
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![diagnostic.message.as_str(), source.as_str()]);
    }
    table
}

/// Print how many rows a table left out
pub fn truncation_note(shown: usize, total: usize) {
    if total > shown {
        println!("{}", format!("... and {} more", total - shown).dimmed());
    }
}
