//! Error attribution - link oracle messages back to the source rows
//!
//! Messages follow `activities.<index>.<field> <text>`. Anything else is
//! kept as is and attributed to no row.

use serde::Serialize;
use serde_json::Value as JsonValue;

const LOCATOR_PREFIX: &str = "activities.";

/// A message parsed against the locator grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocator {
    /// `activities.<index>[.<field>] <text>`
    Located {
        index: usize,
        field: Option<String>,
        text: String,
    },
    Unlocated(String),
}

impl ErrorLocator {
    pub fn parse(message: &str) -> Self {
        let (head, rest) = match message.find(char::is_whitespace) {
            Some(at) => (&message[..at], message[at..].trim_start()),
            None => (message, ""),
        };

        let Some(path) = head.strip_prefix(LOCATOR_PREFIX) else {
            return ErrorLocator::Unlocated(message.to_string());
        };

        let (index, field) = match path.split_once('.') {
            Some((index, field)) => (index, Some(field).filter(|f| !f.is_empty())),
            None => (path, None),
        };

        match index.parse::<usize>() {
            Ok(index) => ErrorLocator::Located {
                index,
                field: field.map(str::to_string),
                text: rest.to_string(),
            },
            Err(_) => ErrorLocator::Unlocated(message.to_string()),
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            ErrorLocator::Located { index, .. } => Some(*index),
            ErrorLocator::Unlocated(_) => None,
        }
    }
}

/// One row of the diagnostics table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    /// The source record the message points at; `None` when nothing resolves
    pub source_row: Option<JsonValue>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorAttributor;

impl ErrorAttributor {
    pub fn new() -> Self {
        Self
    }

    /// One diagnostic per message, same order, no deduplication
    pub fn attribute(&self, messages: &[String], source_activities: &[JsonValue]) -> Vec<Diagnostic> {
        let diagnostics: Vec<Diagnostic> = messages
            .iter()
            .map(|message| Diagnostic {
                message: message.clone(),
                source_row: ErrorLocator::parse(message)
                    .index()
                    .and_then(|index| source_activities.get(index))
                    .cloned(),
            })
            .collect();

        log::debug!(
            "Attributed {} of {} messages to a source row",
            diagnostics.iter().filter(|d| d.source_row.is_some()).count(),
            diagnostics.len()
        );
        diagnostics
    }
}
