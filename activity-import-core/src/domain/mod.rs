//! Core domain entities
//!
//! Pure data structures for the import pipeline - no I/O or external dependencies.

mod activity;
mod field;
mod mapping;
pub mod result;
mod source;
pub mod synonyms;

pub use activity::{display_value, strip_identity, ActivityDraft, IDENTITY_FIELDS};
pub use field::CanonicalField;
pub use mapping::ColumnMapping;
pub use source::{RawDataRow, SourceRows, StructuredImportBundle};
