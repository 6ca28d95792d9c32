//! Column mapping: canonical field -> source column name

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::field::CanonicalField;
use super::result::{Error, Result};

/// Which source column feeds each canonical field
///
/// A source column is assigned to at most one field. Every mutation goes
/// through [`ColumnMapping::assign`], which moves a column instead of sharing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<CanonicalField, String>",
    into = "BTreeMap<CanonicalField, String>"
)]
pub struct ColumnMapping {
    entries: BTreeMap<CanonicalField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column assigned to `field`, if any
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.entries.get(&field).map(String::as_str)
    }

    /// Field currently fed by `column`, if any
    pub fn field_for(&self, column: &str) -> Option<CanonicalField> {
        self.entries
            .iter()
            .find(|(_, c)| c.as_str() == column)
            .map(|(f, _)| *f)
    }

    /// Assign `column` to `field`
    ///
    /// An empty column clears the field. If another field already used the
    /// column, that field becomes unmapped. Returns the field that lost the column.
    pub fn assign(&mut self, field: CanonicalField, column: impl Into<String>) -> Option<CanonicalField> {
        let column = column.into();
        if column.is_empty() {
            self.entries.remove(&field);
            return None;
        }

        let displaced = self.field_for(&column).filter(|f| *f != field);
        if let Some(previous) = displaced {
            self.entries.remove(&previous);
        }
        self.entries.insert(field, column);
        displaced
    }

    /// Unmap `field`
    pub fn clear(&mut self, field: CanonicalField) {
        self.entries.remove(&field);
    }

    /// Entries in field declaration order
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.entries.iter().map(|(f, c)| (*f, c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Required fields with no column, in declaration order
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| f.is_required() && !self.entries.contains_key(f))
            .collect()
    }

    /// Fail with [`Error::MappingIncomplete`] unless every required field is mapped
    pub fn ensure_complete(&self) -> Result<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MappingIncomplete { missing })
        }
    }

    /// Copy of this mapping keeping only entries whose column is in `columns`
    pub fn restricted_to(&self, columns: &[String]) -> ColumnMapping {
        let entries = self
            .entries
            .iter()
            .filter(|(_, c)| columns.iter().any(|col| col == *c))
            .map(|(f, c)| (*f, c.clone()))
            .collect();
        ColumnMapping { entries }
    }
}

impl TryFrom<BTreeMap<CanonicalField, String>> for ColumnMapping {
    type Error = Error;

    fn try_from(entries: BTreeMap<CanonicalField, String>) -> Result<Self> {
        let mut mapping = ColumnMapping::new();
        for (field, column) in entries {
            if let Some(owner) = mapping.field_for(&column) {
                return Err(Error::InvalidMapping(format!(
                    "column '{}' is assigned to both {} and {}",
                    column, owner, field
                )));
            }
            mapping.assign(field, column);
        }
        Ok(mapping)
    }
}

impl From<ColumnMapping> for BTreeMap<CanonicalField, String> {
    fn from(mapping: ColumnMapping) -> Self {
        mapping.entries
    }
}
