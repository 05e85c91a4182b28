//! `relaybot run` - composition root and main loop.

use anyhow::{Context, Result};
use relay_application::{
    BackupPipeline, CommandDispatcher, PollingLoop, RemoteSync, check_remote_storage,
};
use relay_infrastructure::{ConfigService, CsvActionLog, XlsxTableConverter, ensure_artifacts};
use relay_interaction::{TelegramClient, YandexDiskStorage, YandexGptAgent};
use std::sync::Arc;
use std::time::Duration;

use super::{require_telegram, require_yandex_cloud, require_yandex_disk};

pub async fn run(config: &ConfigService) -> Result<()> {
    let settings = config.load_settings()?;
    let secrets = config.load_secrets()?;
    let backup = config.backup_config(&settings)?;

    let telegram = require_telegram(&secrets)?;
    let cloud = require_yandex_cloud(&secrets)?;
    let disk = require_yandex_disk(&secrets)?;

    let created = ensure_artifacts(&backup).with_context(|| {
        format!(
            "Can't create log files {} and {}",
            backup.log_path.display(),
            backup.table_path.display()
        )
    })?;
    for path in &created {
        tracing::info!("[Startup] Created {}", path.display());
    }

    let timeout = Duration::from_secs(settings.http.timeout_secs);
    let storage = Arc::new(YandexDiskStorage::new(disk.token.clone()).with_timeout(timeout));
    check_remote_storage(storage.as_ref()).await;

    let pipeline = Arc::new(BackupPipeline::new(
        Arc::new(CsvActionLog::new(backup.log_path.clone())),
        Arc::new(XlsxTableConverter::new(
            backup.log_path.clone(),
            backup.table_path.clone(),
        )),
        RemoteSync::new(storage, backup.remote_dir.clone()),
    ));

    let agent = Arc::new(YandexGptAgent::new(cloud, &settings.model).with_timeout(timeout));
    let telegram = Arc::new(TelegramClient::new(&telegram.bot_token).with_timeout(timeout));
    let mut dispatcher = CommandDispatcher::new(pipeline, agent, telegram.clone());
    match telegram.get_me().await {
        Ok(me) => match me.username {
            Some(username) => {
                tracing::info!("[Startup] Running as @{}", username);
                dispatcher = dispatcher.with_bot_username(username);
            }
            None => tracing::warn!("[Startup] Bot account has no username"),
        },
        Err(e) => tracing::warn!("[Startup] Failed to fetch bot identity: {}", e),
    }
    let dispatcher = Arc::new(dispatcher);

    tracing::info!(
        "[Startup] Logging actions to {}, backing up to {}",
        backup.log_path.display(),
        backup.remote_dir
    );

    let polling = PollingLoop::new(telegram, dispatcher, settings.http.poll_timeout_secs);
    polling
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[Startup] Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("[Startup] Ctrl-C received, shutting down");
        })
        .await;

    Ok(())
}
