//! Secret configuration file storage.
//!
//! Loads tokens from `secret.json`, falling back to environment variables for any
//! section the file leaves out.

use relay_core::config::{SecretConfig, TelegramConfig, YandexCloudConfig, YandexDiskConfig};
use std::fs;
use std::path::PathBuf;

pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_YANDEX_OAUTH_TOKEN: &str = "YANDEX_OAUTH_TOKEN";
pub const ENV_YANDEX_FOLDER_ID: &str = "YANDEX_FOLDER_ID";
pub const ENV_YANDEX_DISK_TOKEN: &str = "YANDEX_DISK_TOKEN";

/// Errors that can occur during secret storage operations.
#[derive(Debug)]
pub enum SecretStorageError {
    /// Configuration file not found.
    NotFound(PathBuf),
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parsing error.
    ParseError(serde_json::Error),
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::NotFound(path) => {
                write!(f, "Secret file not found at: {}", path.display())
            }
            SecretStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SecretStorageError::ParseError(e) => write!(f, "JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<std::io::Error> for SecretStorageError {
    fn from(e: std::io::Error) -> Self {
        SecretStorageError::IoError(e)
    }
}

impl From<serde_json::Error> for SecretStorageError {
    fn from(e: serde_json::Error) -> Self {
        SecretStorageError::ParseError(e)
    }
}

/// Read-only storage for secret.json.
///
/// # Security Note
///
/// The file is plaintext JSON and should have mode 600. Token values are never
/// included in error messages or logs.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads and parses secret.json.
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Loads secret.json if present, then fills missing sections from the process
    /// environment.
    ///
    /// Priority:
    /// 1. secret.json
    /// 2. Environment variables (TELEGRAM_BOT_TOKEN, YANDEX_OAUTH_TOKEN,
    ///    YANDEX_FOLDER_ID, YANDEX_DISK_TOKEN)
    pub fn load_with_env(&self) -> Result<SecretConfig, SecretStorageError> {
        let from_file = match self.load() {
            Ok(config) => config,
            Err(SecretStorageError::NotFound(path)) => {
                tracing::debug!(
                    "[SecretStorage] {} not found, using environment only",
                    path.display()
                );
                SecretConfig::default()
            }
            Err(e) => return Err(e),
        };

        Ok(fill_from_env(from_file, |key| std::env::var(key).ok()))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Fills sections that are absent or blank using `lookup`.
pub fn fill_from_env<F>(mut config: SecretConfig, lookup: F) -> SecretConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let telegram_missing = config
        .telegram
        .as_ref()
        .is_none_or(|t| t.bot_token.trim().is_empty());
    if telegram_missing {
        if let Some(bot_token) = get(ENV_TELEGRAM_BOT_TOKEN) {
            config.telegram = Some(TelegramConfig { bot_token });
        }
    }

    let cloud_missing = config
        .yandex_cloud
        .as_ref()
        .is_none_or(|c| c.oauth_token.trim().is_empty());
    if cloud_missing {
        if let (Some(oauth_token), Some(folder_id)) =
            (get(ENV_YANDEX_OAUTH_TOKEN), get(ENV_YANDEX_FOLDER_ID))
        {
            config.yandex_cloud = Some(YandexCloudConfig {
                oauth_token,
                folder_id,
            });
        }
    }

    let disk_missing = config
        .yandex_disk
        .as_ref()
        .is_none_or(|d| d.token.trim().is_empty());
    if disk_missing {
        if let Some(token) = get(ENV_YANDEX_DISK_TOKEN) {
            config.yandex_disk = Some(YandexDiskConfig { token });
        }
    }

    config
}
