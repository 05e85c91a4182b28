use anyhow::{Result, bail};
use relay_application::{RemoteStatus, check_remote_storage};
use relay_infrastructure::ConfigService;
use relay_interaction::YandexDiskStorage;
use std::time::Duration;

use super::{require_telegram, require_yandex_cloud, require_yandex_disk};

pub async fn run(config: &ConfigService) -> Result<()> {
    let settings = config.load_settings()?;
    let secrets = config.load_secrets()?;
    let backup = config.backup_config(&settings)?;

    println!("Action log:    {}", backup.log_path.display());
    println!("Derived table: {}", backup.table_path.display());
    println!("Remote dir:    {}", backup.remote_dir);

    require_telegram(&secrets)?;
    require_yandex_cloud(&secrets)?;
    let disk = require_yandex_disk(&secrets)?;

    let storage = YandexDiskStorage::new(disk.token.clone())
        .with_timeout(Duration::from_secs(settings.http.timeout_secs));

    match check_remote_storage(&storage).await {
        RemoteStatus::Connected => {
            println!("Yandex Disk:   OK");
            Ok(())
        }
        RemoteStatus::InvalidCredentials => bail!("Yandex Disk rejected the token"),
        RemoteStatus::Unreachable(reason) => bail!("Yandex Disk is unreachable: {}", reason),
    }
}
