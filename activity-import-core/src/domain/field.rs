//! Canonical activity fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// A field of the canonical activity record that a source column can feed
///
/// Declaration order matters: column inference walks the fields in this order,
/// so an earlier field wins a header that several fields could claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Date,
    Type,
    Symbol,
    Quantity,
    UnitPrice,
    Fee,
    Currency,
    DataSource,
    Account,
    Comment,
}

impl CanonicalField {
    /// All fields in declaration order
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::Date,
        CanonicalField::Type,
        CanonicalField::Symbol,
        CanonicalField::Quantity,
        CanonicalField::UnitPrice,
        CanonicalField::Fee,
        CanonicalField::Currency,
        CanonicalField::DataSource,
        CanonicalField::Account,
        CanonicalField::Comment,
    ];

    /// Wire name of the field
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Type => "type",
            CanonicalField::Symbol => "symbol",
            CanonicalField::Quantity => "quantity",
            CanonicalField::UnitPrice => "unitPrice",
            CanonicalField::Fee => "fee",
            CanonicalField::Currency => "currency",
            CanonicalField::DataSource => "dataSource",
            CanonicalField::Account => "account",
            CanonicalField::Comment => "comment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::Date => "Activity Date",
            CanonicalField::Type => "Activity Type",
            CanonicalField::Symbol => "Symbol",
            CanonicalField::Quantity => "Quantity",
            CanonicalField::UnitPrice => "Unit Price",
            CanonicalField::Fee => "Fee",
            CanonicalField::Currency => "Currency",
            CanonicalField::DataSource => "Data Source",
            CanonicalField::Account => "Account",
            CanonicalField::Comment => "Comment",
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CanonicalField::Type => {
                Some("Accepted values: buy, sell, dividend, fee, interest, liability")
            }
            CanonicalField::Fee => Some("Use 0 if your CSV has no fee column"),
            CanonicalField::DataSource => {
                Some("Optional, map when the file includes the original data provider")
            }
            _ => None,
        }
    }

    /// Whether an import can proceed with this field unmapped
    pub fn is_required(&self) -> bool {
        !matches!(
            self,
            CanonicalField::DataSource | CanonicalField::Account | CanonicalField::Comment
        )
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CanonicalField {
    type Err = Error;

    /// Accepts the wire name case-insensitively, so `unitprice` and `unitPrice` both parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.key().to_lowercase() == wanted)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}
