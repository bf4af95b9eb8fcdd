//! Application configuration management.
//!
//! Configuration is stored at `~/.config/fintrack/config.json` and holds the
//! backend URL, the currency symbol used for display, and the last email that
//! logged in. `FINTRACK_API_URL` overrides the stored URL.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "fintrack";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Log file written by the terminal UI
pub const LOG_FILE: &str = "fintrack.log";

pub const ENV_API_URL: &str = "FINTRACK_API_URL";
pub const ENV_EMAIL: &str = "FINTRACK_EMAIL";
pub const ENV_PASSWORD: &str = "FINTRACK_PASSWORD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub currency_symbol: String,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            currency_symbol: "$".to_string(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// `~/.config/fintrack/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Backend URL: environment, then config file, then the local default
    pub fn api_base_url(&self) -> String {
        std::env::var(ENV_API_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Email to prefill on the login screen
    pub fn prefill_email(&self) -> Option<String> {
        std::env::var(ENV_EMAIL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.last_email.clone())
    }

    /// `~/.cache/fintrack`; holds the session file and the log
    pub fn app_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Snapshot directory for one account
    pub fn cache_dir(&self, email: &str) -> Result<PathBuf> {
        Ok(Self::app_dir()?.join(sanitize_path_component(email)))
    }
}

/// Keep `[A-Za-z0-9._-]`, replace the rest with `_`
pub fn sanitize_path_component(s: &str) -> String {
    let cleaned: String = s
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // never produce "." or ".."
    if cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len().max(1))
    } else {
        cleaned
    }
}
