//! HTTP collaborators: Yandex Disk backup storage, YandexGPT completions and the
//! Telegram Bot API.

pub mod telegram;
pub mod yandex_disk;
pub mod yandex_gpt_agent;
pub mod yandex_iam;

pub use telegram::{BotIdentity, TelegramClient};
pub use yandex_disk::YandexDiskStorage;
pub use yandex_gpt_agent::YandexGptAgent;
pub use yandex_iam::IamTokenClient;
