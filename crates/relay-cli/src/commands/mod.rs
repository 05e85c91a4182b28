pub mod check;
pub mod init;
pub mod run;

use anyhow::{Result, anyhow};
use relay_core::config::{SecretConfig, TelegramConfig, YandexCloudConfig, YandexDiskConfig};
use relay_infrastructure::storage::{
    ENV_TELEGRAM_BOT_TOKEN, ENV_YANDEX_DISK_TOKEN, ENV_YANDEX_FOLDER_ID, ENV_YANDEX_OAUTH_TOKEN,
};

pub(crate) fn require_telegram(secrets: &SecretConfig) -> Result<&TelegramConfig> {
    secrets
        .telegram
        .as_ref()
        .filter(|t| !t.bot_token.trim().is_empty())
        .ok_or_else(|| missing("telegram.bot_token", ENV_TELEGRAM_BOT_TOKEN))
}

pub(crate) fn require_yandex_cloud(secrets: &SecretConfig) -> Result<&YandexCloudConfig> {
    secrets
        .yandex_cloud
        .as_ref()
        .filter(|c| !c.oauth_token.trim().is_empty() && !c.folder_id.trim().is_empty())
        .ok_or_else(|| {
            missing(
                "yandex_cloud.oauth_token / yandex_cloud.folder_id",
                &format!("{} and {}", ENV_YANDEX_OAUTH_TOKEN, ENV_YANDEX_FOLDER_ID),
            )
        })
}

pub(crate) fn require_yandex_disk(secrets: &SecretConfig) -> Result<&YandexDiskConfig> {
    secrets
        .yandex_disk
        .as_ref()
        .filter(|d| !d.token.trim().is_empty())
        .ok_or_else(|| missing("yandex_disk.token", ENV_YANDEX_DISK_TOKEN))
}

fn missing(field: &str, env: &str) -> anyhow::Error {
    anyhow!(
        "Missing {} in secret.json (or set {}). Run `relaybot init` to create a template.",
        field,
        env
    )
}
