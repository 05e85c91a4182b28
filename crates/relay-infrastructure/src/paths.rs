//! Path management for relaybot configuration and artifacts.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/relaybot/          # Config directory
//! ├── config.toml              # Settings (paths, model, timeouts)
//! └── secret.json              # Bot, cloud and disk tokens
//!
//! ~/user_actions.csv           # Action log (default location)
//! ~/user_actions.xlsx          # Derived table (default location)
//! ```
//!
//! A base directory override replaces both the config directory and the home
//! directory, which keeps tests inside a temporary directory.

use relay_core::backup::{BackupConfig, DEFAULT_LOG_FILE_NAME, DEFAULT_TABLE_FILE_NAME};
use relay_core::config::{BackupSettings, SecretConfig};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "relaybot";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves every path relaybot reads or writes.
#[derive(Debug, Clone, Default)]
pub struct RelayPaths {
    base: Option<PathBuf>,
}

impl RelayPaths {
    /// Creates a resolver. `base_path` overrides the platform directories.
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            base: base_path.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory (e.g. `~/.config/relaybot/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Directory holding the artifacts when no explicit path is configured.
    pub fn artifacts_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::home_dir().ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to secret.json.
    ///
    /// # Security Note
    ///
    /// This file holds plaintext tokens; keep it at mode 600.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    /// Builds the backup layout from settings, filling unset paths with defaults.
    pub fn backup_config(&self, settings: &BackupSettings) -> Result<BackupConfig, PathError> {
        let log_path = match &settings.log_file {
            Some(path) => path.clone(),
            None => self.artifacts_dir()?.join(DEFAULT_LOG_FILE_NAME),
        };
        let table_path = match &settings.table_file {
            Some(path) => path.clone(),
            None => self.artifacts_dir()?.join(DEFAULT_TABLE_FILE_NAME),
        };
        Ok(BackupConfig::new(
            log_path,
            table_path,
            settings.remote_dir.clone(),
        ))
    }

    /// Ensures secret.json exists, writing an empty template if it doesn't.
    ///
    /// The template is created with mode 600 on Unix.
    pub fn ensure_secret_file(&self) -> Result<PathBuf, std::io::Error> {
        let secret_path = self
            .secret_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        if secret_path.exists() {
            return Ok(secret_path);
        }

        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template_json = serde_json::to_string_pretty(&SecretConfig::template())
            .map_err(std::io::Error::other)?;
        std::fs::write(&secret_path, template_json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        Ok(secret_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_dir_default() {
        let config_dir = RelayPaths::new(None).config_dir().unwrap();
        assert!(config_dir.ends_with("relaybot"));
    }

    #[test]
    fn test_base_override() {
        let temp_dir = TempDir::new().unwrap();
        let paths = RelayPaths::new(Some(temp_dir.path()));
        assert_eq!(paths.config_dir().unwrap(), temp_dir.path());
        assert_eq!(
            paths.secret_file().unwrap(),
            temp_dir.path().join("secret.json")
        );
    }

    #[test]
    fn test_backup_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = RelayPaths::new(Some(temp_dir.path()));
        let backup = paths.backup_config(&BackupSettings::default()).unwrap();
        assert_eq!(backup.log_path, temp_dir.path().join("user_actions.csv"));
        assert_eq!(backup.table_path, temp_dir.path().join("user_actions.xlsx"));
        assert_eq!(backup.remote_dir, "/bot_logs");
    }

    #[test]
    fn test_backup_config_explicit_paths() {
        let paths = RelayPaths::new(None);
        let settings = BackupSettings {
            log_file: Some(PathBuf::from("/srv/bot/log.csv")),
            table_file: Some(PathBuf::from("/srv/bot/log.xlsx")),
            remote_dir: "/archive".into(),
        };
        let backup = paths.backup_config(&settings).unwrap();
        assert_eq!(backup.log_path, PathBuf::from("/srv/bot/log.csv"));
        assert_eq!(backup.remote_table_path(), "/archive/log.xlsx");
    }

    #[test]
    fn test_ensure_secret_file_writes_template_once() {
        let temp_dir = TempDir::new().unwrap();
        let paths = RelayPaths::new(Some(temp_dir.path()));

        let path = paths.ensure_secret_file().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: SecretConfig = serde_json::from_str(&content).unwrap();
        assert!(parsed.yandex_disk.is_some());

        std::fs::write(&path, "{}").unwrap();
        paths.ensure_secret_file().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
