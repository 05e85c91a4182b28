//! Configuration service.
//!
//! Loads config.toml and secret.json from the relaybot config directory and
//! resolves the backup layout from them.

use crate::paths::RelayPaths;
use crate::storage::{SecretStorage, TomlFile};
use relay_core::backup::BackupConfig;
use relay_core::config::{RelayConfig, SecretConfig};
use relay_core::{RelayError, Result};
use std::path::PathBuf;

/// Entry point for every configuration file relaybot reads.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    paths: RelayPaths,
}

impl ConfigService {
    pub fn new(paths: RelayPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &RelayPaths {
        &self.paths
    }

    fn settings_file(&self) -> Result<TomlFile<RelayConfig>> {
        let path = self
            .paths
            .config_file()
            .map_err(|e| RelayError::config(e.to_string()))?;
        Ok(TomlFile::new(path))
    }

    /// Loads config.toml. A missing or empty file yields the defaults.
    pub fn load_settings(&self) -> Result<RelayConfig> {
        let file = self.settings_file()?;
        let loaded = file.load().map_err(|e| {
            RelayError::config(format!(
                "Failed to load {}: {}",
                file.path().display(),
                e
            ))
        })?;
        Ok(loaded.unwrap_or_default())
    }

    /// Writes a default config.toml unless one exists. Returns the path when written.
    pub fn write_default_settings(&self) -> Result<Option<PathBuf>> {
        let file = self.settings_file()?;
        if file.path().exists() {
            return Ok(None);
        }
        file.save(&RelayConfig::default())
            .map_err(|e| RelayError::config(e.to_string()))?;
        Ok(Some(file.path().to_path_buf()))
    }

    /// Loads secret.json with environment fallback.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        let path = self
            .paths
            .secret_file()
            .map_err(|e| RelayError::config(e.to_string()))?;
        SecretStorage::with_path(path)
            .load_with_env()
            .map_err(|e| RelayError::config(e.to_string()))
    }

    /// Resolves the backup layout for `settings`.
    pub fn backup_config(&self, settings: &RelayConfig) -> Result<BackupConfig> {
        self.paths
            .backup_config(&settings.backup)
            .map_err(|e| RelayError::config(e.to_string()))
    }
}
