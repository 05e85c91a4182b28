//! BackupPipeline - record, convert and mirror one user action.
//!
//! Each run goes through `RECORD -> CONVERT -> SYNC`. Only a failed record aborts
//! the run; conversion and sync failures are logged as warnings and reported in the
//! returned [`PipelineOutcome`].

use chrono::{DateTime, FixedOffset};
use relay_core::action::{ActionRecord, ActionRecorder, ConvertError, ConvertReport, TableConverter};
use relay_core::backup::{SyncError, SyncReport};
use relay_core::{RelayError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;

use crate::remote_sync::RemoteSync;

/// What happened after the record was written.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub convert: std::result::Result<ConvertReport, ConvertError>,
    pub sync: std::result::Result<SyncReport, SyncError>,
}

impl PipelineOutcome {
    /// True when both the table and the remote copy are up to date.
    pub fn is_complete(&self) -> bool {
        self.convert.is_ok() && self.sync.is_ok()
    }
}

pub struct BackupPipeline {
    recorder: Arc<dyn ActionRecorder>,
    converter: Arc<dyn TableConverter>,
    sync: RemoteSync,
    // one run at a time, so table regeneration and uploads never interleave
    run_lock: Mutex<()>,
}

impl BackupPipeline {
    pub fn new(
        recorder: Arc<dyn ActionRecorder>,
        converter: Arc<dyn TableConverter>,
        sync: RemoteSync,
    ) -> Self {
        Self {
            recorder,
            converter,
            sync,
            run_lock: Mutex::new(()),
        }
    }

    /// Records an action and brings the table and the remote copy up to date.
    ///
    /// Returns `Err` only when the record could not be appended; in that case
    /// neither conversion nor sync is attempted.
    pub async fn record(
        &self,
        user_id: i64,
        action: &str,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<PipelineOutcome> {
        let _guard = self.run_lock.lock().await;

        let record = ActionRecord::new(user_id, action, timestamp);
        let recorder = self.recorder.clone();
        let appended = task::spawn_blocking(move || recorder.append(&record))
            .await
            .unwrap_or_else(|e| {
                Err(RelayError::internal(format!(
                    "Failed to spawn blocking task: {}",
                    e
                )))
            });
        if let Err(e) = appended {
            if e.is_permission_denied() {
                tracing::error!(
                    "[BackupPipeline] No permission to write action log {}: {}",
                    self.recorder.log_path().display(),
                    e
                );
            } else {
                tracing::error!("[BackupPipeline] Failed to record '{}' for user {}: {}", action, user_id, e);
            }
            return Err(e);
        }
        tracing::info!("[BackupPipeline] Recorded '{}' for user {}", action, user_id);

        let converter = self.converter.clone();
        let convert = task::spawn_blocking(move || converter.regenerate())
            .await
            .unwrap_or_else(|e| Err(ConvertError::Task(e.to_string())));
        match &convert {
            Ok(report) => tracing::info!(
                "[BackupPipeline] Table regenerated with {} rows",
                report.rows
            ),
            Err(e) => tracing::warn!("[BackupPipeline] Table conversion failed: {}", e),
        }

        let log_path = self.recorder.log_path();
        let table_path = self.converter.table_path();
        let sync = self.sync.push(&log_path, &table_path).await;
        match &sync {
            Ok(report) => tracing::info!(
                "[BackupPipeline] Backed up {} file(s) to {}",
                report.uploaded.len(),
                self.sync.remote_dir()
            ),
            Err(e) => tracing::warn!("[BackupPipeline] Remote backup failed: {}", e),
        }

        Ok(PipelineOutcome { convert, sync })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::RelayError;
    use relay_core::backup::{InMemoryRemoteStorage, RemoteCall};
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Keeps rows in memory and mirrors them to a file so sync has something to read.
    struct FakeRecorder {
        path: PathBuf,
        rows: StdMutex<Vec<ActionRecord>>,
        fail_with: Option<RelayError>,
    }

    impl FakeRecorder {
        fn new(path: PathBuf) -> Self {
            Self {
                path,
                rows: StdMutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(path: PathBuf, error: RelayError) -> Self {
            Self {
                fail_with: Some(error),
                ..Self::new(path)
            }
        }
    }

    impl ActionRecorder for FakeRecorder {
        fn append(&self, record: &ActionRecord) -> Result<()> {
            if let Some(e) = &self.fail_with {
                return Err(e.clone());
            }
            let mut rows = self.rows.lock().unwrap();
            rows.push(record.clone());
            let content: String = rows
                .iter()
                .map(|r| format!("{}\n", r.to_row().join(",")))
                .collect();
            std::fs::write(&self.path, content)?;
            Ok(())
        }

        fn log_path(&self) -> PathBuf {
            self.path.clone()
        }
    }

    struct FakeConverter {
        path: PathBuf,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeConverter {
        fn new(path: PathBuf, fail: bool) -> Self {
            Self {
                path,
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl TableConverter for FakeConverter {
        fn regenerate(&self) -> std::result::Result<ConvertReport, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ConvertError::Malformed {
                    line: 3,
                    message: "found record with 2 fields, but the previous record has 3 fields"
                        .into(),
                });
            }
            std::fs::write(&self.path, b"table")?;
            Ok(ConvertReport {
                rows: 1,
                replaced: false,
            })
        }

        fn table_path(&self) -> PathBuf {
            self.path.clone()
        }
    }

    fn timestamp() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-01T10:00:00+00:00").unwrap()
    }

    struct Fixture {
        _dir: TempDir,
        recorder: Arc<FakeRecorder>,
        converter: Arc<FakeConverter>,
        storage: Arc<InMemoryRemoteStorage>,
        pipeline: BackupPipeline,
    }

    fn fixture(recorder_error: Option<RelayError>, convert_fails: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("user_actions.csv");
        let table = dir.path().join("user_actions.xlsx");
        let recorder = Arc::new(match recorder_error {
            Some(e) => FakeRecorder::failing(log, e),
            None => FakeRecorder::new(log),
        });
        let converter = Arc::new(FakeConverter::new(table, convert_fails));
        let storage = Arc::new(InMemoryRemoteStorage::new());
        let pipeline = BackupPipeline::new(
            recorder.clone(),
            converter.clone(),
            RemoteSync::new(storage.clone(), "/bot_logs"),
        );
        Fixture {
            _dir: dir,
            recorder,
            converter,
            storage,
            pipeline,
        }
    }

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let f = fixture(None, false);

        let outcome = f.pipeline.record(42, "start", timestamp()).await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(f.recorder.rows.lock().unwrap().len(), 1);
        assert_eq!(f.converter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.storage.object_count(), 2);
    }

    #[tokio::test]
    async fn test_permission_error_aborts_before_convert_and_sync() {
        let f = fixture(
            Some(RelayError::PermissionDenied {
                message: "/var/log/user_actions.csv: permission denied".into(),
            }),
            false,
        );

        let err = f.pipeline.record(42, "start", timestamp()).await.unwrap_err();

        assert!(err.is_permission_denied());
        assert_eq!(f.converter.calls.load(Ordering::SeqCst), 0);
        assert!(f.storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_other_record_errors_also_abort() {
        let f = fixture(Some(RelayError::io("disk full")), false);

        let err = f.pipeline.record(42, "help", timestamp()).await.unwrap_err();

        assert!(err.is_io());
        assert!(!err.is_permission_denied());
        assert_eq!(f.converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_conversion_failure_still_syncs() {
        let f = fixture(None, true);

        let outcome = f.pipeline.record(42, "answer", timestamp()).await.unwrap();

        assert!(matches!(outcome.convert, Err(ConvertError::Malformed { line: 3, .. })));
        // the table was never written, so the log goes up and the table upload fails
        assert!(matches!(outcome.sync, Err(SyncError::Upload { .. })));
        assert!(f.storage.calls().contains(&RemoteCall::Validate));
        assert!(f.storage.object("/bot_logs/user_actions.csv").is_some());
    }

    #[tokio::test]
    async fn test_sync_failure_is_not_an_error() {
        let f = fixture(None, false);
        f.storage.reject_credentials();

        let outcome = f.pipeline.record(42, "start", timestamp()).await.unwrap();

        assert!(outcome.convert.is_ok());
        assert!(!outcome.is_complete());
        assert_eq!(outcome.sync.unwrap_err(), SyncError::InvalidCredentials);
        assert_eq!(f.storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_serialized() {
        let f = fixture(None, false);
        f.storage.add_dir("/bot_logs");
        let pipeline = Arc::new(f.pipeline);

        let mut handles = Vec::new();
        for user_id in 0..8 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline.record(user_id, "answer", timestamp()).await.map(|o| o.is_complete())
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        assert_eq!(f.recorder.rows.lock().unwrap().len(), 8);
        assert_eq!(f.converter.calls.load(Ordering::SeqCst), 8);
        // every run issues the same four calls, never interleaved with another run
        let calls = f.storage.calls();
        assert_eq!(calls.len(), 32);
        for chunk in calls.chunks(4) {
            assert_eq!(chunk[0], RemoteCall::Validate);
            assert!(matches!(chunk[1], RemoteCall::Exists(_)));
            assert!(matches!(chunk[2], RemoteCall::Upload { .. }));
            assert!(matches!(chunk[3], RemoteCall::Upload { .. }));
        }
    }

    /// Appends only after a signal arrives from another task on the runtime.
    struct GatedRecorder {
        path: PathBuf,
        gate: StdMutex<std::sync::mpsc::Receiver<()>>,
    }

    impl ActionRecorder for GatedRecorder {
        fn append(&self, _record: &ActionRecord) -> Result<()> {
            self.gate
                .lock()
                .unwrap()
                .recv_timeout(std::time::Duration::from_secs(5))
                .map_err(|_| RelayError::io("append ran on the runtime thread"))
        }

        fn log_path(&self) -> PathBuf {
            self.path.clone()
        }
    }

    #[tokio::test]
    async fn test_file_stages_do_not_block_the_runtime() {
        let dir = TempDir::new().unwrap();
        let (release, gate) = std::sync::mpsc::channel();
        let converter = Arc::new(FakeConverter::new(dir.path().join("user_actions.xlsx"), false));
        let pipeline = BackupPipeline::new(
            Arc::new(GatedRecorder {
                path: dir.path().join("user_actions.csv"),
                gate: StdMutex::new(gate),
            }),
            converter.clone(),
            RemoteSync::new(Arc::new(InMemoryRemoteStorage::new()), "/bot_logs"),
        );

        // single-threaded runtime: the release only runs if append yields the thread
        let (outcome, _) = tokio::join!(pipeline.record(42, "start", timestamp()), async {
            release.send(()).unwrap();
        });

        assert!(outcome.is_ok());
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    }
}
