//! Configuration models.
//!
//! `SecretConfig` holds credentials (secret.json), `RelayConfig` holds everything
//! else (config.toml). Both deserialize with defaults for missing sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backup::DEFAULT_REMOTE_DIR;

/// Default YandexGPT model, appended to `gpt://<folder_id>/`.
pub const DEFAULT_MODEL: &str = "yandexgpt/rc";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Secrets
// ============================================================================

/// Root structure of secret.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub yandex_cloud: Option<YandexCloudConfig>,
    #[serde(default)]
    pub yandex_disk: Option<YandexDiskConfig>,
}

/// Telegram Bot API credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

/// Yandex Cloud credentials for the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexCloudConfig {
    /// OAuth token exchanged for a short-lived IAM token
    pub oauth_token: String,
    /// Folder that owns the model
    pub folder_id: String,
}

/// Yandex Disk OAuth token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexDiskConfig {
    pub token: String,
}

impl SecretConfig {
    /// Template written by `relaybot init`.
    pub fn template() -> Self {
        Self {
            telegram: Some(TelegramConfig {
                bot_token: String::new(),
            }),
            yandex_cloud: Some(YandexCloudConfig {
                oauth_token: String::new(),
                folder_id: String::new(),
            }),
            yandex_disk: Some(YandexDiskConfig {
                token: String::new(),
            }),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Root structure of config.toml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub backup: BackupSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Where the action log and its derived table live.
///
/// Unset file paths resolve to the home directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSettings {
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub table_file: Option<PathBuf>,
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            log_file: None,
            table_file: None,
            remote_dir: default_remote_dir(),
        }
    }
}

fn default_remote_dir() -> String {
    DEFAULT_REMOTE_DIR.to_string()
}

/// Completion request parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_model")]
    pub name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Timeouts for outgoing HTTP calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout for the disk, IAM and completion APIs
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Long-polling timeout passed to getUpdates
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}
