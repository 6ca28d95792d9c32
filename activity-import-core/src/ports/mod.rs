//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The services
//! depend only on these traits, not on concrete implementations.

mod import_api;

pub use import_api::{
    ActivityImporter, DryRunRequest, DryRunResponse, ImportRequest, ValidationContext,
    ValidationOracle,
};
