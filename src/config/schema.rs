//! Configuration schema for vaulticon
//!
//! Configuration is stored at `~/.config/vaulticon/config.toml`

use super::ConfigManager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Icon service and cache settings
    pub icons: IconsConfig,

    /// Sync run settings
    pub sync: SyncConfig,

    /// Vault entry enumeration
    pub entries: EntriesConfig,
}

impl Config {
    /// Check values that would make a sync run meaningless.
    ///
    /// Returns the first problem found as a human-readable reason.
    pub fn validate(&self) -> Result<(), String> {
        if self.icons.base_url.trim().is_empty() {
            return Err("icons.base_url must not be empty".to_string());
        }
        if self.sync.concurrency == 0 {
            return Err("sync.concurrency must be at least 1".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("sync.max_retries must be at least 1".to_string());
        }
        if self.entries.command.is_empty() {
            return Err("entries.command must name a program".to_string());
        }
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Icon service and cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconsConfig {
    /// Base URL of the icon service; icons live at `<base_url>/<id>/icon.png`
    pub base_url: String,

    /// Directory holding one `<id>.png` per entry
    pub cache_dir: PathBuf,

    /// Icon returned for entries with nothing cached
    pub default_icon: PathBuf,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://icons.bitwarden.net".to_string(),
            cache_dir: ConfigManager::data_dir().join("icons"),
            default_icon: ConfigManager::data_dir().join("icon_blank.png"),
        }
    }
}

/// Sync run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum fetches in flight at once
    pub concurrency: usize,

    /// Attempts per entry; only timeouts and 429 responses consume one
    pub max_retries: u32,

    /// Wait after a 429 that carries no usable Retry-After header
    pub retry_delay_secs: u64,

    /// Longest wait honoured for a single 429, whatever Retry-After says
    pub max_retry_after_secs: u64,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Marker file shared by every invocation
    pub lock_path: PathBuf,
}

impl SyncConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 15,
            max_retries: 2,
            retry_delay_secs: 3,
            max_retry_after_secs: 30,
            timeout_secs: 2,
            lock_path: std::env::temp_dir().join("vaulticon_icon_sync.lock"),
        }
    }
}

/// Entry enumeration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntriesConfig {
    /// Program and arguments printing one entry id per line
    pub command: Vec<String>,
}

impl Default for EntriesConfig {
    fn default() -> Self {
        Self {
            command: vec!["rbw".to_string(), "list".to_string()],
        }
    }
}
