//! Application configuration management.
//!
//! Configuration holds the business API location and the business/feature
//! the setup runs for. It is stored at
//! `~/.config/procare-setup/config.json`. Front ends layer their own
//! overrides (flags, environment) on top of the loaded file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "procare-setup";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub business_id: Option<String>,
    pub feature_id: Option<String>,
    /// Store integrations on the business rather than the signed-in user
    #[serde(default)]
    pub business_scoped: bool,
    /// Bearer token, never written to the config file
    #[serde(skip)]
    pub token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn require_business_id(&self) -> Result<&str> {
        self.business_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No business id configured"))
    }

    pub fn require_feature_id(&self) -> Result<&str> {
        self.feature_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No feature id configured"))
    }
}
