//! In-memory remote storage.
//!
//! Keeps uploaded objects in a map and can be told to fail individual operations.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use super::RemoteStorage;
use crate::error::{RelayError, Result};

/// Operations recorded by [`InMemoryRemoteStorage`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Validate,
    Exists(String),
    CreateDir(String),
    Upload { remote_path: String, overwrite: bool },
}

#[derive(Debug, Default)]
struct State {
    dirs: BTreeSet<String>,
    objects: BTreeMap<String, Vec<u8>>,
    calls: Vec<RemoteCall>,
    reject_credentials: bool,
    fail_validation: bool,
    fail_create_dir: bool,
    fail_uploads_to: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryRemoteStorage {
    state: Mutex<State>,
}

impl InMemoryRemoteStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `validate_credentials` answer `Ok(false)`.
    pub fn reject_credentials(&self) {
        self.lock().reject_credentials = true;
    }

    /// Makes `validate_credentials` fail with a network error.
    pub fn fail_validation(&self) {
        self.lock().fail_validation = true;
    }

    /// Makes `create_dir` fail.
    pub fn fail_create_dir(&self) {
        self.lock().fail_create_dir = true;
    }

    /// Makes uploads to `remote_path` fail.
    pub fn fail_uploads_to(&self, remote_path: &str) {
        self.lock().fail_uploads_to.insert(remote_path.to_string());
    }

    pub fn add_dir(&self, remote_path: &str) {
        self.lock().dirs.insert(remote_path.to_string());
    }

    pub fn has_dir(&self, remote_path: &str) -> bool {
        self.lock().dirs.contains(remote_path)
    }

    pub fn object(&self, remote_path: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(remote_path).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // a panic while holding the lock only happens in a failing test
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RemoteStorage for InMemoryRemoteStorage {
    async fn validate_credentials(&self) -> Result<bool> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::Validate);
        if state.fail_validation {
            return Err(RelayError::network("simulated network failure"));
        }
        Ok(!state.reject_credentials)
    }

    async fn exists(&self, remote_path: &str) -> Result<bool> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::Exists(remote_path.to_string()));
        Ok(state.dirs.contains(remote_path) || state.objects.contains_key(remote_path))
    }

    async fn create_dir(&self, remote_path: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::CreateDir(remote_path.to_string()));
        if state.fail_create_dir {
            return Err(RelayError::http(507, "simulated insufficient storage"));
        }
        state.dirs.insert(remote_path.to_string());
        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_path: &str, overwrite: bool) -> Result<()> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| RelayError::io_at(local_path, e))?;

        let mut state = self.lock();
        state.calls.push(RemoteCall::Upload {
            remote_path: remote_path.to_string(),
            overwrite,
        });
        if state.fail_uploads_to.contains(remote_path) {
            return Err(RelayError::http(503, "simulated upload failure"));
        }
        if !overwrite && state.objects.contains_key(remote_path) {
            return Err(RelayError::http(409, format!("{} already exists", remote_path)));
        }
        state.objects.insert(remote_path.to_string(), bytes);
        Ok(())
    }
}
