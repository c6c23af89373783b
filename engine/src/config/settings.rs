// Engine settings: defaults, overlaid by an optional JSON file, overlaid by environment variables.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::EngineError;

pub const CONFIG_PATH_ENV: &str = "DASHBOARD_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    pub hours: u32,
    pub poll_interval_secs: u64,
    pub digest_interval_secs: u64,
    pub storage: StorageSettings,
    pub notifier: NotifierSettings,
    // When set, every rendered chart set is also written here as JSON.
    pub charts_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub root: PathBuf,
    pub timeout_secs: u64,
    pub price_prefix: String,
    pub price_stem: String,
    pub comments_prefix: String,
    pub comments_stem: String,
    pub asset_column: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotifierSettings {
    pub api_base: String,
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub recipient: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            hours: 12,
            poll_interval_secs: 600,
            digest_interval_secs: 24 * 60 * 60,
            storage: StorageSettings::default(),
            notifier: NotifierSettings::default(),
            charts_dir: None,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            root: PathBuf::from("data/bucket-iot-sentiment-analysis"),
            timeout_secs: 10,
            price_prefix: "coins".to_string(),
            price_stem: "coins".to_string(),
            comments_prefix: "reddit_comments".to_string(),
            comments_stem: "reddit_comments".to_string(),
            asset_column: "bitcoin".to_string(),
        }
    }
}

impl Default for NotifierSettings {
    fn default() -> Self {
        NotifierSettings {
            api_base: "https://graph.facebook.com/v21.0".to_string(),
            access_token: None,
            phone_number_id: None,
            recipient: None,
            timeout_secs: 15,
        }
    }
}

impl EngineSettings {
    pub fn load() -> Result<Self, EngineError> {
        let mut settings = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => EngineSettings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            EngineError::ConfigError(format!("Invalid settings file '{}': {}", path.display(), e))
        })
    }

    // Takes a lookup function so tests do not have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("WSP_TOKEN") {
            self.notifier.access_token = Some(token);
        }
        if let Some(phone) = lookup("WSP_PHONE") {
            self.notifier.phone_number_id = Some(phone);
        }
        if let Some(target) = lookup("WSP_PHONE_TARGET") {
            self.notifier.recipient = Some(target);
        }
        if let Some(root) = lookup("DASHBOARD_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(root);
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.hours == 0 {
            return Err(EngineError::ConfigError("hours must be greater than 0".to_string()));
        }
        if self.poll_interval_secs == 0 || self.digest_interval_secs == 0 {
            return Err(EngineError::ConfigError("poll and digest intervals must be greater than 0".to_string()));
        }
        if self.storage.timeout_secs == 0 || self.notifier.timeout_secs == 0 {
            return Err(EngineError::ConfigError("timeouts must be greater than 0".to_string()));
        }
        if self.storage.asset_column.trim().is_empty() {
            return Err(EngineError::ConfigError("storage.asset_column must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.hours))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn digest_interval(&self) -> Duration {
        Duration::from_secs(self.digest_interval_secs)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage.timeout_secs)
    }
}
