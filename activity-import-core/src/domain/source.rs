//! Source records as read from the user's file

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One data line of a delimited-text file, keyed by header
pub type RawDataRow = BTreeMap<String, String>;

/// Pre-shaped object graph from a structured-object file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredImportBundle {
    #[serde(default)]
    pub accounts: Vec<JsonValue>,
    /// Identity-stripped activities, in file order
    #[serde(default)]
    pub activities: Vec<JsonValue>,
    #[serde(default)]
    pub asset_profiles: Vec<JsonValue>,
    #[serde(default)]
    pub tags: Vec<JsonValue>,
}

/// Rows an import session was built from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceRows {
    Delimited {
        columns: Vec<String>,
        rows: Vec<RawDataRow>,
    },
    Structured {
        bundle: StructuredImportBundle,
    },
}

impl SourceRows {
    /// Source records as JSON, indexed the same way as the drafts built from them
    pub fn attribution_rows(&self) -> Vec<JsonValue> {
        match self {
            SourceRows::Delimited { rows, .. } => rows.iter().map(row_to_json).collect(),
            SourceRows::Structured { bundle } => bundle.activities.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceRows::Delimited { rows, .. } => rows.len(),
            SourceRows::Structured { bundle } => bundle.activities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_delimited(&self) -> bool {
        matches!(self, SourceRows::Delimited { .. })
    }
}

fn row_to_json(row: &RawDataRow) -> JsonValue {
    JsonValue::Object(
        row.iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect(),
    )
}
