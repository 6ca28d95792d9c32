//! Import API ports
//!
//! The two calls this crate makes to the outside world: a dry-run validation
//! of drafts and the final import of the selected activities.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::result::Result;
use crate::domain::{ActivityDraft, ColumnMapping};

/// Everything the oracle needs besides the drafts themselves
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationContext {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub asset_profiles: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<JsonValue>,
    /// Accounts the user already owns, used to resolve account columns
    pub user_accounts: Vec<JsonValue>,
}

/// Dry-run validation request
///
/// Only constructible through [`DryRunRequest::new`], which always sets the
/// dry-run flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunRequest {
    pub activities: Vec<ActivityDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_mapping: Option<ColumnMapping>,
    is_dry_run: bool,
    #[serde(flatten)]
    pub context: ValidationContext,
}

impl DryRunRequest {
    pub fn new(
        activities: Vec<ActivityDraft>,
        column_mapping: Option<ColumnMapping>,
        context: ValidationContext,
    ) -> Self {
        Self {
            activities,
            column_mapping,
            is_dry_run: true,
            context,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.is_dry_run
    }
}

/// Activities as accepted and annotated by the oracle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DryRunResponse {
    #[serde(default)]
    pub activities: Vec<ActivityDraft>,
}

/// Final import request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub accounts: Vec<JsonValue>,
    pub activities: Vec<ActivityDraft>,
    pub asset_profiles: Vec<JsonValue>,
    pub tags: Vec<JsonValue>,
}

/// Dry-run validation oracle
///
/// Implementations decide what makes an activity valid. A rejection is
/// reported as [`Error::Validation`](crate::Error::Validation) carrying the
/// oracle's messages; an unreachable oracle as
/// [`Error::Transport`](crate::Error::Transport).
#[async_trait]
pub trait ValidationOracle: Send + Sync {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<DryRunResponse>;
}

/// Final importer; never called with a dry-run request
#[async_trait]
pub trait ActivityImporter: Send + Sync {
    async fn import(&self, request: &ImportRequest) -> Result<()>;
}
