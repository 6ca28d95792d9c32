//! Header aliases accepted for each canonical field
//!
//! All aliases are lowercase. A header matches an alias when its trimmed,
//! lowercased form equals the alias or contains it.

use super::field::CanonicalField;

/// Aliases accepted for `field`
pub fn synonyms(field: CanonicalField) -> &'static [&'static str] {
    match field {
        CanonicalField::Date => &["date", "trade date", "transaction date"],
        CanonicalField::Type => &["type", "action", "buy/sell"],
        CanonicalField::Symbol => &["symbol", "ticker", "code"],
        CanonicalField::Quantity => &["quantity", "qty", "units", "shares"],
        CanonicalField::UnitPrice => &["unit price", "unitprice", "price", "trade price", "value"],
        CanonicalField::Fee => &["fee", "commission", "ib commission"],
        CanonicalField::Currency => &["currency", "ccy", "currency primary"],
        CanonicalField::DataSource => &["datasource", "data source"],
        CanonicalField::Account => &["account", "account id", "accountid"],
        CanonicalField::Comment => &["comment", "note", "notes"],
    }
}
