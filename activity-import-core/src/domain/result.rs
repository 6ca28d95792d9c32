//! Result and error types for the core library

use thiserror::Error;

use super::field::CanonicalField;

/// Generic one-line explanation used whenever nothing more specific is available
pub const UNEXPECTED_FORMAT: &str = "Unexpected format";

/// Shown when the import API cannot be reached at all
pub const SERVICE_UNAVAILABLE: &str = "Oops! Something went wrong. Please try again later.";

/// Migration hint for documents exported before `orders` was renamed
pub const LEGACY_ORDERS_MESSAGE: &str = "orders needs to be renamed to activities";

/// Structured document parsed but has no usable `activities` list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{}", LEGACY_ORDERS_MESSAGE)]
    LegacyOrders,

    #[error("{}", UNEXPECTED_FORMAT)]
    MissingActivities,
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown file extension, or content that does not parse as the detected kind
    #[error("{0}")]
    Format(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Missing column mapping for required fields: {}", join_fields(.missing))]
    MappingIncomplete { missing: Vec<CanonicalField> },

    /// Rejected by the validation oracle; messages may carry `activities.<index>.<field>` locators
    #[error("{}", .0.first().map(String::as_str).unwrap_or(UNEXPECTED_FORMAT))]
    Validation(Vec<String>),

    #[error("Import service unavailable: {0}")]
    Transport(String),

    #[error("Invalid column mapping: {0}")]
    InvalidMapping(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Not allowed while {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Every message this error contributes to the diagnostics table, in order
    ///
    /// Transport failures contribute nothing: no row can be blamed for them.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            Self::Transport(_) => Vec::new(),
            other => vec![other.to_string()],
        }
    }

    /// The single line shown above the diagnostics table
    pub fn summary(&self) -> String {
        match self {
            Self::Validation(messages) => messages
                .first()
                .filter(|m| !m.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| UNEXPECTED_FORMAT.to_string()),
            Self::Transport(_) => SERVICE_UNAVAILABLE.to_string(),
            Self::Format(msg) if msg.trim().is_empty() => UNEXPECTED_FORMAT.to_string(),
            other => other.to_string(),
        }
    }
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
