//! TelegramClient - minimal Telegram Bot API client (long polling + replies).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::chat::{ChatTransport, ChatUser, IncomingMessage, ReplyFormat};
use relay_core::{RelayError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Client bound to one bot token.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

/// One entry returned by `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub date: i64,
    pub chat: TgChat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// The bot's own account, as returned by `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

impl Update {
    /// Converts a text message from a user into the dispatcher's input.
    ///
    /// Returns `None` for updates without a message, text or sender.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        let text = message.text?;
        let from = message.from?;
        let date = DateTime::<Utc>::from_timestamp(message.date, 0)?;

        Some(IncomingMessage {
            chat_id: message.chat.id,
            message_id: message.message_id,
            from: ChatUser {
                id: from.id,
                first_name: from.first_name,
                last_name: from.last_name,
            },
            date,
            text,
        })
    }
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ForceReply>,
}

#[derive(Serialize)]
struct ForceReply {
    force_reply: bool,
    selective: bool,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/bot{}", TELEGRAM_API_URL, bot_token),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the timeout for regular (non-polling) calls.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Long-polls for new updates starting at `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, poll_timeout_secs: u64) -> Result<Vec<Update>> {
        let body = GetUpdatesRequest {
            offset,
            timeout: poll_timeout_secs,
            allowed_updates: vec!["message"],
        };
        // the server holds the request for up to poll_timeout_secs
        let timeout = self.timeout + Duration::from_secs(poll_timeout_secs);
        self.call("getUpdates", &body, timeout).await
    }

    /// Fetches the bot's own account.
    pub async fn get_me(&self) -> Result<BotIdentity> {
        self.call("getMe", &serde_json::json!({}), self.timeout).await
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        // URLs carry the bot token, so errors are reported without them
        let response = self
            .client
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| RelayError::network(format!("Telegram {} failed: {}", method, e.without_url())))?;

        let status = response.status();
        let parsed: ApiResponse<T> = response.json().await.map_err(|e| {
            RelayError::network(format!(
                "Failed to parse Telegram {} response: {}",
                method,
                e.without_url()
            ))
        })?;

        unwrap_api_response(method, status.as_u16(), parsed)
    }
}

fn unwrap_api_response<T>(method: &str, status: u16, response: ApiResponse<T>) -> Result<T> {
    if response.ok {
        if let Some(result) = response.result {
            return Ok(result);
        }
    }

    let code = response.error_code.unwrap_or(status);
    let description = response
        .description
        .unwrap_or_else(|| "no description".to_string());
    let message = format!("Telegram {} error: {}", method, description);
    if code == 401 {
        Err(RelayError::Unauthorized(message))
    } else {
        Err(RelayError::http(code, message))
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str, format: ReplyFormat) -> Result<()> {
        let body = match format {
            ReplyFormat::Plain => SendMessageRequest {
                chat_id,
                text,
                parse_mode: None,
                reply_markup: None,
            },
            ReplyFormat::HtmlForceReply => SendMessageRequest {
                chat_id,
                text,
                parse_mode: Some("HTML"),
                reply_markup: Some(ForceReply {
                    force_reply: true,
                    selective: true,
                }),
            },
        };

        let _: serde_json::Value = self.call("sendMessage", &body, self.timeout).await?;
        Ok(())
    }
}
