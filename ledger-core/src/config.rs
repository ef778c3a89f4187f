//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "storage": { "mode": "remote", "apiBaseUrl": "http://localhost:9000/api", "requestTimeoutSecs": 120 },
//!   "ai": { "model": "gemini-2.0-flash", "apiKey": "...", "replyLanguage": "English" }
//! }
//! ```
//! Keys this crate does not know about are kept when the file is saved.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::adapters::gemini::{DEFAULT_MODEL, GEMINI_BASE_URL};
use crate::adapters::remote::DEFAULT_API_BASE_URL;
use crate::domain::result::{Error, Result};

pub const SETTINGS_FILENAME: &str = "settings.json";

/// Transport timeout for backend and Gemini requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Where the transaction set is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// The backend API
    #[default]
    Remote,
    /// A DuckDB file in the data directory
    Local,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Remote => write!(f, "remote"),
            StorageMode::Local => write!(f, "local"),
        }
    }
}

impl FromStr for StorageMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "api" => Ok(StorageMode::Remote),
            "local" | "duckdb" => Ok(StorageMode::Local),
            other => Err(Error::Config(format!(
                "Unknown storage mode '{}' (expected 'remote' or 'local')",
                other
            ))),
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    storage: StorageSettings,
    #[serde(default)]
    ai: AiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<StorageMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply_language: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Resolved configuration: file values, then environment overrides, then defaults
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_mode: StorageMode,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub ai_model: String,
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub reply_language: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(SettingsFile::default(), |_| None)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load config from the data directory
    ///
    /// Environment overrides:
    /// - `LEDGER_LENS_STORAGE`: storage mode
    /// - `LEDGER_LENS_API_URL`: backend API root
    /// - `GEMINI_API_KEY`: Gemini API key
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, |name| std::env::var(name).ok())
    }

    fn load_with_env(data_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self::resolve(read_settings(data_dir)?, env))
    }

    fn resolve(raw: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let storage_mode = match non_empty(env("LEDGER_LENS_STORAGE")) {
            Some(value) => match value.parse() {
                Ok(mode) => mode,
                Err(e) => {
                    warn!("Ignoring LEDGER_LENS_STORAGE: {}", e);
                    raw.storage.mode.unwrap_or_default()
                }
            },
            None => raw.storage.mode.unwrap_or_default(),
        };

        Self {
            storage_mode,
            api_base_url: non_empty(env("LEDGER_LENS_API_URL"))
                .or_else(|| non_empty(raw.storage.api_base_url))
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                raw.storage
                    .request_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            ai_model: non_empty(raw.ai.model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ai_api_key: non_empty(env("GEMINI_API_KEY")).or_else(|| non_empty(raw.ai.api_key)),
            ai_base_url: non_empty(raw.ai.base_url).unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            reply_language: non_empty(raw.ai.reply_language),
        }
    }

    /// Save config to the data directory
    ///
    /// Only the storage mode, API root, model and reply language are written; the API key
    /// and everything else in the file are left as they are.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = read_settings(data_dir)?;

        settings.storage.mode = Some(self.storage_mode);
        settings.storage.api_base_url = Some(self.api_base_url.clone());
        settings.ai.model = Some(self.ai_model.clone());
        settings.ai.reply_language = self.reply_language.clone();

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILENAME), content)?;
        Ok(())
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join(SETTINGS_FILENAME);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }

    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Invalid {}: {}", settings_path.display(), e))
    })
}
