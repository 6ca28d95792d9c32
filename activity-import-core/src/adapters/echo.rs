//! Offline oracle
//!
//! Accepts every draft unchanged. Lets the pipeline run without an import API,
//! e.g. to preview how a file maps before pointing it at a real server.

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::ports::{
    ActivityImporter, DryRunRequest, DryRunResponse, ImportRequest, ValidationOracle,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct EchoOracle;

impl EchoOracle {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ValidationOracle for EchoOracle {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<DryRunResponse> {
        log::debug!("Offline dry-run accepted {} activities", request.activities.len());
        Ok(DryRunResponse {
            activities: request.activities.clone(),
        })
    }
}

#[async_trait]
impl ActivityImporter for EchoOracle {
    async fn import(&self, request: &ImportRequest) -> Result<()> {
        log::info!(
            "Offline mode: {} activities not sent anywhere",
            request.activities.len()
        );
        Ok(())
    }
}
