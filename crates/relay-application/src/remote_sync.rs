//! RemoteSync - mirrors the local artifacts into a fixed remote directory.
//!
//! A push runs in a fixed order and stops at the first failing stage:
//!
//! 1. validate the storage credential
//! 2. check the local log exists
//! 3. make sure the remote directory exists, creating it when absent
//! 4. upload the log, then the table, both overwriting the remote copies
//!
//! Repeated pushes of unchanged files leave the remote side in the same state.

use relay_core::backup::{RemoteStorage, SyncError, SyncReport, remote_path_for};
use std::path::Path;
use std::sync::Arc;

pub struct RemoteSync {
    storage: Arc<dyn RemoteStorage>,
    remote_dir: String,
}

impl RemoteSync {
    pub fn new(storage: Arc<dyn RemoteStorage>, remote_dir: impl Into<String>) -> Self {
        Self {
            storage,
            remote_dir: remote_dir.into(),
        }
    }

    pub fn remote_dir(&self) -> &str {
        &self.remote_dir
    }

    /// Pushes the log and the table to the remote directory.
    pub async fn push(&self, local_log: &Path, local_table: &Path) -> Result<SyncReport, SyncError> {
        match self.storage.validate_credentials().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("[RemoteSync] Remote storage rejected the credential");
                return Err(SyncError::InvalidCredentials);
            }
            Err(e) => {
                tracing::warn!("[RemoteSync] Credential check failed: {}", e);
                return Err(SyncError::Authentication(e.to_string()));
            }
        }

        if !local_log.exists() {
            tracing::warn!(
                "[RemoteSync] Local log {} does not exist, nothing to push",
                local_log.display()
            );
            return Err(SyncError::MissingLocalFile(local_log.to_path_buf()));
        }

        let created_dir = self.ensure_remote_dir().await?;

        let mut uploaded = Vec::with_capacity(2);
        for local in [local_log, local_table] {
            let remote_path = remote_path_for(&self.remote_dir, local);
            self.storage
                .upload(local, &remote_path, true)
                .await
                .map_err(|e| {
                    tracing::warn!("[RemoteSync] Upload to {} failed: {}", remote_path, e);
                    SyncError::Upload {
                        remote_path: remote_path.clone(),
                        message: e.to_string(),
                    }
                })?;
            tracing::info!("[RemoteSync] Uploaded {} -> {}", local.display(), remote_path);
            uploaded.push(remote_path);
        }

        Ok(SyncReport {
            created_dir,
            uploaded,
        })
    }

    /// Returns whether the directory had to be created.
    async fn ensure_remote_dir(&self) -> Result<bool, SyncError> {
        let dir_error = |e: relay_core::RelayError| SyncError::RemoteDirectory {
            path: self.remote_dir.clone(),
            message: e.to_string(),
        };

        if self.storage.exists(&self.remote_dir).await.map_err(dir_error)? {
            return Ok(false);
        }

        self.storage
            .create_dir(&self.remote_dir)
            .await
            .map_err(dir_error)?;
        tracing::info!("[RemoteSync] Created remote directory {}", self.remote_dir);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::backup::{InMemoryRemoteStorage, RemoteCall};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        log: std::path::PathBuf,
        table: std::path::PathBuf,
        storage: Arc<InMemoryRemoteStorage>,
        sync: RemoteSync,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("user_actions.csv");
        let table = dir.path().join("user_actions.xlsx");
        fs::write(&log, "id,datetime,action\n42,2024-01-01T10:00:00+00:00,start\n").unwrap();
        fs::write(&table, b"xlsx bytes").unwrap();

        let storage = Arc::new(InMemoryRemoteStorage::new());
        let sync = RemoteSync::new(storage.clone(), "/bot_logs");
        Fixture {
            _dir: dir,
            log,
            table,
            storage,
            sync,
        }
    }

    #[tokio::test]
    async fn test_push_creates_dir_and_uploads_both() {
        let f = fixture();

        let report = f.sync.push(&f.log, &f.table).await.unwrap();

        assert!(report.created_dir);
        assert_eq!(
            report.uploaded,
            vec!["/bot_logs/user_actions.csv", "/bot_logs/user_actions.xlsx"]
        );
        assert!(f.storage.has_dir("/bot_logs"));
        assert_eq!(
            f.storage.object("/bot_logs/user_actions.csv").unwrap(),
            fs::read(&f.log).unwrap()
        );
        assert_eq!(
            f.storage.object("/bot_logs/user_actions.xlsx").unwrap(),
            b"xlsx bytes".to_vec()
        );
        assert_eq!(
            f.storage.calls(),
            vec![
                RemoteCall::Validate,
                RemoteCall::Exists("/bot_logs".into()),
                RemoteCall::CreateDir("/bot_logs".into()),
                RemoteCall::Upload {
                    remote_path: "/bot_logs/user_actions.csv".into(),
                    overwrite: true
                },
                RemoteCall::Upload {
                    remote_path: "/bot_logs/user_actions.xlsx".into(),
                    overwrite: true
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_second_push_is_idempotent() {
        let f = fixture();

        f.sync.push(&f.log, &f.table).await.unwrap();
        let log_after_first = f.storage.object("/bot_logs/user_actions.csv").unwrap();
        let table_after_first = f.storage.object("/bot_logs/user_actions.xlsx").unwrap();
        let calls_after_first = f.storage.calls().len();

        let second = f.sync.push(&f.log, &f.table).await.unwrap();

        assert!(!second.created_dir);
        assert_eq!(f.storage.object_count(), 2);
        assert_eq!(
            f.storage.object("/bot_logs/user_actions.csv").unwrap(),
            log_after_first
        );
        assert_eq!(
            f.storage.object("/bot_logs/user_actions.xlsx").unwrap(),
            table_after_first
        );

        let second_uploads: Vec<_> = f.storage.calls()[calls_after_first..]
            .iter()
            .filter(|call| matches!(call, RemoteCall::Upload { .. }))
            .cloned()
            .collect();
        assert_eq!(
            second_uploads,
            vec![
                RemoteCall::Upload {
                    remote_path: "/bot_logs/user_actions.csv".to_string(),
                    overwrite: true,
                },
                RemoteCall::Upload {
                    remote_path: "/bot_logs/user_actions.xlsx".to_string(),
                    overwrite: true,
                },
            ]
        );
        let creates = f
            .storage
            .calls()
            .into_iter()
            .filter(|call| matches!(call, RemoteCall::CreateDir(_)))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn test_existing_dir_is_not_recreated() {
        let f = fixture();
        f.storage.add_dir("/bot_logs");

        let report = f.sync.push(&f.log, &f.table).await.unwrap();
        assert!(!report.created_dir);
    }

    #[tokio::test]
    async fn test_rejected_credential_stops_before_any_remote_change() {
        let f = fixture();
        f.storage.reject_credentials();

        let err = f.sync.push(&f.log, &f.table).await.unwrap_err();
        assert_eq!(err, SyncError::InvalidCredentials);
        assert_eq!(f.storage.calls(), vec![RemoteCall::Validate]);
        assert_eq!(f.storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_is_authentication_error() {
        let f = fixture();
        f.storage.fail_validation();

        let err = f.sync.push(&f.log, &f.table).await.unwrap_err();
        assert!(matches!(err, SyncError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_missing_local_log() {
        let f = fixture();
        fs::remove_file(&f.log).unwrap();

        let err = f.sync.push(&f.log, &f.table).await.unwrap_err();
        assert_eq!(err, SyncError::MissingLocalFile(f.log.clone()));
        assert_eq!(f.storage.calls(), vec![RemoteCall::Validate]);
    }

    #[tokio::test]
    async fn test_directory_failure() {
        let f = fixture();
        f.storage.fail_create_dir();

        let err = f.sync.push(&f.log, &f.table).await.unwrap_err();
        match err {
            SyncError::RemoteDirectory { path, .. } => assert_eq!(path, "/bot_logs"),
            other => panic!("Expected RemoteDirectory, got {:?}", other),
        }
        assert_eq!(f.storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_table_upload_failure_names_remote_path() {
        let f = fixture();
        f.storage.fail_uploads_to("/bot_logs/user_actions.xlsx");

        let err = f.sync.push(&f.log, &f.table).await.unwrap_err();
        match err {
            SyncError::Upload { remote_path, .. } => {
                assert_eq!(remote_path, "/bot_logs/user_actions.xlsx")
            }
            other => panic!("Expected Upload, got {:?}", other),
        }
        // the log went up before the table failed
        assert!(f.storage.object("/bot_logs/user_actions.csv").is_some());
    }

    #[tokio::test]
    async fn test_missing_table_fails_at_upload() {
        let f = fixture();
        fs::remove_file(&f.table).unwrap();

        let err = f.sync.push(&f.log, &f.table).await.unwrap_err();
        assert!(matches!(err, SyncError::Upload { .. }));
    }
}
