//! File-backed storage: the action log, its derived table and configuration files.

mod artifacts;
mod csv_action_log;
mod secret_storage;
mod toml_file;
mod xlsx_table;

pub use artifacts::ensure_artifacts;
pub use csv_action_log::CsvActionLog;
pub use secret_storage::{
    ENV_TELEGRAM_BOT_TOKEN, ENV_YANDEX_DISK_TOKEN, ENV_YANDEX_FOLDER_ID, ENV_YANDEX_OAUTH_TOKEN,
    SecretStorage, SecretStorageError, fill_from_env,
};
pub use toml_file::{TomlFile, TomlFileError};
pub use xlsx_table::XlsxTableConverter;
