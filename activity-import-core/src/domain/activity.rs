//! Activity draft model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::field::CanonicalField;

/// Keys that identify a persisted record and must never reach a draft
pub const IDENTITY_FIELDS: &[&str] = &["id"];

/// A pre-persistence activity in canonical shape
///
/// Values are kept untyped: this crate reshapes, the validation oracle judges.
/// Keys a structured source carries beyond the canonical ones are preserved in
/// `extra` so the oracle sees the record unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<JsonValue>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<JsonValue>,
    /// Set by the oracle on activities it accepted for display but would not import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ActivityDraft {
    fn slot(&mut self, field: CanonicalField) -> &mut Option<JsonValue> {
        match field {
            CanonicalField::Date => &mut self.date,
            CanonicalField::Type => &mut self.activity_type,
            CanonicalField::Symbol => &mut self.symbol,
            CanonicalField::Quantity => &mut self.quantity,
            CanonicalField::UnitPrice => &mut self.unit_price,
            CanonicalField::Fee => &mut self.fee,
            CanonicalField::Currency => &mut self.currency,
            CanonicalField::DataSource => &mut self.data_source,
            CanonicalField::Account => &mut self.account,
            CanonicalField::Comment => &mut self.comment,
        }
    }

    pub fn get(&self, field: CanonicalField) -> Option<&JsonValue> {
        match field {
            CanonicalField::Date => self.date.as_ref(),
            CanonicalField::Type => self.activity_type.as_ref(),
            CanonicalField::Symbol => self.symbol.as_ref(),
            CanonicalField::Quantity => self.quantity.as_ref(),
            CanonicalField::UnitPrice => self.unit_price.as_ref(),
            CanonicalField::Fee => self.fee.as_ref(),
            CanonicalField::Currency => self.currency.as_ref(),
            CanonicalField::DataSource => self.data_source.as_ref(),
            CanonicalField::Account => self.account.as_ref(),
            CanonicalField::Comment => self.comment.as_ref(),
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: JsonValue) {
        *self.slot(field) = Some(value);
    }

    pub fn has_error(&self) -> bool {
        matches!(&self.error, Some(e) if !e.is_null())
    }

    /// Field value as display text; strings unquoted, absent as empty
    pub fn display(&self, field: CanonicalField) -> String {
        self.get(field).map(display_value).unwrap_or_default()
    }
}

/// Render a JSON scalar the way a table cell shows it
pub fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Remove identity keys from a structured activity in place
pub fn strip_identity(activity: &mut JsonValue) {
    if let JsonValue::Object(map) = activity {
        for key in IDENTITY_FIELDS {
            map.remove(*key);
        }
    }
}
