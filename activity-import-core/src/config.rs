//! Configuration management
//!
//! Settings live in `settings.json` inside the app directory:
//! ```json
//! {
//!   "api": { "baseUrl": "https://folio.example.com", "token": "...", "timeoutSecs": 30 },
//!   "accounts": [ { "id": "8e1d...", "name": "Brokerage", "currency": "USD" } ],
//!   "importProfiles": { "profiles": { "broker": { "columnMapping": { "date": "Trade Date" } } } }
//! }
//! ```
//! `accounts` lists the user's existing accounts; every dry run carries them
//! so the import API can resolve account columns. Keys this crate does not
//! manage are kept as they are when saving.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ColumnMapping;

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "AIMP_API_URL";
pub const ENV_API_TOKEN: &str = "AIMP_API_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "AIMP_TIMEOUT_SECS";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    accounts: Vec<serde_json::Value>,
    #[serde(default)]
    import_profiles: ImportProfilesContainer,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportProfilesContainer {
    #[serde(default)]
    profiles: BTreeMap<String, ImportProfile>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

/// Saved column mapping for a recurring file layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProfile {
    pub column_mapping: ColumnMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl ImportProfile {
    pub fn new(column_mapping: ColumnMapping) -> Self {
        Self {
            column_mapping,
            saved_at: Some(Utc::now()),
        }
    }
}

/// Import tool configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    /// The user's existing accounts, sent with every dry run
    pub user_accounts: Vec<serde_json::Value>,
    pub import_profiles: BTreeMap<String, ImportProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_accounts: Vec::new(),
            import_profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config from the app directory, then apply environment overrides
    ///
    /// A missing or corrupt settings file yields defaults.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(app_dir)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from the settings file only
    pub fn load_file(app_dir: &Path) -> Result<Self> {
        let raw = read_settings(app_dir)?.unwrap_or_else(|e| {
            log::warn!("Ignoring {}", e);
            SettingsFile::default()
        });

        Ok(Self {
            api_base_url: raw.api.base_url.filter(|u| !u.is_empty()),
            api_token: raw.api.token.filter(|t| !t.is_empty()),
            timeout_secs: raw.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            user_accounts: raw.accounts,
            import_profiles: raw.import_profiles.profiles,
        })
    }

    /// Override settings from `lookup` (the environment, in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => log::warn!("Ignoring {}='{}': expected a positive number", ENV_TIMEOUT_SECS, raw),
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Save import profiles to the app directory
    ///
    /// Only profiles are written; the `api` section and unknown keys stay as
    /// they are on disk, so environment overrides never leak into the file.
    /// A corrupt settings file is left alone and reported as an error.
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(app_dir)
            .with_context(|| format!("Failed to create {}", app_dir.display()))?;

        let mut settings = read_settings(app_dir)?
            .map_err(|e| anyhow::anyhow!("Refusing to overwrite {}; fix or remove it first", e))?;
        settings.import_profiles.profiles = self.import_profiles.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        let path = app_dir.join(SETTINGS_FILE);
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&ImportProfile> {
        self.import_profiles.get(name)
    }

    /// Store `mapping` under `name`, replacing any profile of that name
    pub fn save_profile(&mut self, name: &str, mapping: ColumnMapping) {
        self.import_profiles
            .insert(name.to_string(), ImportProfile::new(mapping));
    }
}

/// Read the raw settings file
///
/// The outer error is an I/O failure; the inner one describes a file that
/// exists but does not parse.
fn read_settings(app_dir: &Path) -> Result<std::result::Result<SettingsFile, String>> {
    let path = app_dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(Ok(SettingsFile::default()));
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&content)
        .map_err(|e| format!("unreadable {}: {}", path.display(), e)))
}
