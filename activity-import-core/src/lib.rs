//! Activity Import Core - turning broker exports into validated activities
//!
//! This crate implements the import pipeline following hexagonal architecture:
//!
//! - **domain**: Canonical fields, column mappings, activity drafts, errors
//! - **ports**: Trait definitions for the import API (dry-run oracle, importer)
//! - **services**: Mapping inference, ingestion, normalization, validation,
//!   error attribution and the import wizard
//! - **adapters**: Concrete implementations (HTTP client, offline echo)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::{EchoOracle, HttpImportApi};
use config::Config;
use ports::{ActivityImporter, ValidationContext, ValidationOracle};
use services::{ImportWizard, ValidationCoordinator};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{ActivityDraft, CanonicalField, ColumnMapping};
pub use services::{Diagnostic, ImportSession, ValidationOutcome, WizardState};

/// Main context for import operations
///
/// Holds the configuration and the import API the wizard talks to.
pub struct ImportContext {
    pub config: Config,
    pub app_dir: PathBuf,
    oracle: Arc<dyn ValidationOracle>,
    importer: Arc<dyn ActivityImporter>,
}

impl ImportContext {
    /// Create a context from the app directory
    ///
    /// `offline` swaps the import API for [`EchoOracle`], which accepts every
    /// draft and imports nothing.
    pub fn new(app_dir: &Path, offline: bool) -> Result<Self> {
        let config = Config::load(app_dir)?;

        let (oracle, importer): (Arc<dyn ValidationOracle>, Arc<dyn ActivityImporter>) = if offline {
            log::info!("Offline mode: drafts are not sent to an import API");
            (Arc::new(EchoOracle::new()), Arc::new(EchoOracle::new()))
        } else {
            let base_url = config.api_base_url.as_deref().context(
                "No import API configured. Set AIMP_API_URL or api.baseUrl in settings.json, or use --offline",
            )?;
            let api = Arc::new(HttpImportApi::new(base_url, config.api_token.clone(), config.timeout())?);
            (api.clone(), api)
        };

        Ok(Self::with_ports(config, app_dir.to_path_buf(), oracle, importer))
    }

    /// Create a context around explicit port implementations
    pub fn with_ports(
        config: Config,
        app_dir: PathBuf,
        oracle: Arc<dyn ValidationOracle>,
        importer: Arc<dyn ActivityImporter>,
    ) -> Self {
        Self {
            config,
            app_dir,
            oracle,
            importer,
        }
    }

    /// A fresh wizard in `SelectFile`, dry-running against the user's accounts
    pub fn wizard(&self) -> ImportWizard {
        let context = ValidationContext {
            user_accounts: self.config.user_accounts.clone(),
            ..Default::default()
        };
        ImportWizard::new(ValidationCoordinator::new(Arc::clone(&self.oracle)), context)
    }

    pub fn importer(&self) -> &dyn ActivityImporter {
        self.importer.as_ref()
    }

    /// Persist profile changes
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.app_dir)
    }
}
