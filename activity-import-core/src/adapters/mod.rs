//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - HTTP client for the import API (dry-run oracle and importer)
//! - Offline echo oracle that accepts every draft

pub mod echo;
pub mod http;

pub use echo::EchoOracle;
pub use http::HttpImportApi;
