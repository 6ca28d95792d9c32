//! Column mapper - infer which header feeds which canonical field

use std::collections::HashSet;

use crate::domain::synonyms::synonyms;
use crate::domain::{CanonicalField, ColumnMapping};

/// Best-effort header to field inference
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnMapper;

impl ColumnMapper {
    pub fn new() -> Self {
        Self
    }

    /// Infer a mapping from raw headers
    ///
    /// Fields are visited in declaration order and each takes the first unused
    /// header (in header order) that equals or contains one of its aliases.
    /// First match wins: a later, more specific alias never reclaims a header.
    pub fn infer(&self, headers: &[String]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        let mut used: HashSet<&str> = HashSet::new();

        for field in CanonicalField::ALL {
            let aliases = synonyms(field);
            let found = headers.iter().find(|header| {
                !header.is_empty()
                    && !used.contains(header.as_str())
                    && header_matches(header, aliases)
            });

            if let Some(header) = found {
                used.insert(header.as_str());
                mapping.assign(field, header.clone());
            }
        }

        log::debug!(
            "Inferred {} of {} fields from {} headers",
            mapping.len(),
            CanonicalField::ALL.len(),
            headers.len()
        );
        mapping
    }
}

fn header_matches(header: &str, aliases: &[&str]) -> bool {
    let normalized = header.trim().to_lowercase();
    aliases
        .iter()
        .any(|alias| normalized == *alias || normalized.contains(alias))
}
