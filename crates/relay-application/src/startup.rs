//! Startup checks that never abort the bot.

use relay_core::backup::RemoteStorage;

/// Result of the remote credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Connected,
    InvalidCredentials,
    Unreachable(String),
}

/// Validates the remote storage credential once and logs the result.
pub async fn check_remote_storage(storage: &dyn RemoteStorage) -> RemoteStatus {
    match storage.validate_credentials().await {
        Ok(true) => {
            tracing::info!("[Startup] Remote storage connection OK");
            RemoteStatus::Connected
        }
        Ok(false) => {
            tracing::warn!("[Startup] Remote storage rejected the token, backups will fail");
            RemoteStatus::InvalidCredentials
        }
        Err(e) => {
            tracing::error!("[Startup] Remote storage connection error: {}", e);
            RemoteStatus::Unreachable(e.to_string())
        }
    }
}
