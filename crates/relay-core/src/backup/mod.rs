//! Remote backup of the local artifacts.
//!
//! Provides the storage abstraction used to mirror the action log and its derived
//! table, and the fixed set of paths the backup works with.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::Result;

mod memory;

pub use memory::{InMemoryRemoteStorage, RemoteCall};

/// Default remote directory for the mirrored artifacts.
pub const DEFAULT_REMOTE_DIR: &str = "/bot_logs";

/// Default file name of the action log.
pub const DEFAULT_LOG_FILE_NAME: &str = "user_actions.csv";

/// Default file name of the derived table.
pub const DEFAULT_TABLE_FILE_NAME: &str = "user_actions.xlsx";

/// Local and remote locations used by the backup pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    /// Local append-only CSV log
    pub log_path: PathBuf,
    /// Local derived spreadsheet
    pub table_path: PathBuf,
    /// Remote directory both artifacts are uploaded to
    pub remote_dir: String,
}

impl BackupConfig {
    pub fn new(
        log_path: impl Into<PathBuf>,
        table_path: impl Into<PathBuf>,
        remote_dir: impl Into<String>,
    ) -> Self {
        Self {
            log_path: log_path.into(),
            table_path: table_path.into(),
            remote_dir: remote_dir.into(),
        }
    }

    /// Default layout: both artifacts directly under `dir`, mirrored to `/bot_logs`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(
            dir.join(DEFAULT_LOG_FILE_NAME),
            dir.join(DEFAULT_TABLE_FILE_NAME),
            DEFAULT_REMOTE_DIR,
        )
    }

    /// Remote path of the log copy.
    pub fn remote_log_path(&self) -> String {
        remote_path_for(&self.remote_dir, &self.log_path)
    }

    /// Remote path of the table copy.
    pub fn remote_table_path(&self) -> String {
        remote_path_for(&self.remote_dir, &self.table_path)
    }
}

/// Remote path for `local` inside `remote_dir`, keeping the local file name.
pub fn remote_path_for(remote_dir: &str, local: &Path) -> String {
    let file_name = local
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", remote_dir.trim_end_matches('/'), file_name)
}

/// Result of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Whether the remote directory had to be created
    pub created_dir: bool,
    /// Remote paths written, in upload order
    pub uploaded: Vec<String>,
}

/// Reasons a push can fail.
///
/// The variant names the stage that failed; no partial-success state is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("remote storage rejected the credential")]
    InvalidCredentials,

    #[error("could not validate credential: {0}")]
    Authentication(String),

    #[error("local file not found: {}", .0.display())]
    MissingLocalFile(PathBuf),

    #[error("failed to prepare remote directory {path}: {message}")]
    RemoteDirectory { path: String, message: String },

    #[error("failed to upload to {remote_path}: {message}")]
    Upload {
        remote_path: String,
        message: String,
    },
}

/// Remote object storage used as a backup destination.
///
/// Paths are absolute remote paths such as `/bot_logs/user_actions.csv`.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Checks the configured credential.
    ///
    /// `Ok(false)` means the backend answered and rejected it; `Err` means the
    /// check itself could not be completed.
    async fn validate_credentials(&self) -> Result<bool>;

    /// Returns whether a remote resource exists.
    async fn exists(&self, remote_path: &str) -> Result<bool>;

    /// Creates a remote directory.
    async fn create_dir(&self, remote_path: &str) -> Result<()>;

    /// Uploads a local file to `remote_path`.
    async fn upload(&self, local_path: &Path, remote_path: &str, overwrite: bool) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_paths_use_local_file_names() {
        let config = BackupConfig::in_dir(Path::new("/home/bot"));
        assert_eq!(config.remote_log_path(), "/bot_logs/user_actions.csv");
        assert_eq!(config.remote_table_path(), "/bot_logs/user_actions.xlsx");
    }

    #[test]
    fn test_remote_dir_trailing_slash() {
        let config = BackupConfig::new("/tmp/a.csv", "/tmp/a.xlsx", "/backups/");
        assert_eq!(config.remote_log_path(), "/backups/a.csv");
    }
}
