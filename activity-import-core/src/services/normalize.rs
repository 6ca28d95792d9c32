//! Activity normalizer - turn source records into canonical drafts
//!
//! Pure reshaping: values are carried as found, never coerced or validated.

use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};
use crate::domain::{ActivityDraft, ColumnMapping, RawDataRow, StructuredImportBundle};

#[derive(Debug, Default, Clone, Copy)]
pub struct ActivityNormalizer;

impl ActivityNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// One draft per row, in row order
    ///
    /// A field is set only when its mapped column is present in the row; the
    /// value is the raw cell text.
    pub fn from_mapping(&self, mapping: &ColumnMapping, rows: &[RawDataRow]) -> Vec<ActivityDraft> {
        rows.iter()
            .map(|row| {
                let mut draft = ActivityDraft::default();
                for (field, column) in mapping.iter() {
                    if let Some(value) = row.get(column) {
                        draft.set(field, JsonValue::String(value.clone()));
                    }
                }
                draft
            })
            .collect()
    }

    /// The bundle's activities as drafts, in file order
    ///
    /// Entries that are not objects are reported together, each with its
    /// position so the message can be traced back to the file.
    pub fn from_structured_bundle(&self, bundle: &StructuredImportBundle) -> Result<Vec<ActivityDraft>> {
        let mut drafts = Vec::with_capacity(bundle.activities.len());
        let mut problems = Vec::new();

        for (index, activity) in bundle.activities.iter().enumerate() {
            if !activity.is_object() {
                problems.push(format!("activities.{} must be an object", index));
                continue;
            }
            match serde_json::from_value::<ActivityDraft>(activity.clone()) {
                Ok(draft) => drafts.push(draft),
                Err(e) => problems.push(format!("activities.{} {}", index, e)),
            }
        }

        if !problems.is_empty() {
            log::debug!("{} structured activities could not be read", problems.len());
            return Err(Error::Validation(problems));
        }

        Ok(drafts)
    }
}
