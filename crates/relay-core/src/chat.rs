//! Chat platform abstraction used by the command dispatcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Author of an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl ChatUser {
    /// Display name: first name plus last name when present.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub from: ChatUser,
    pub date: DateTime<Utc>,
    pub text: String,
}

impl IncomingMessage {
    /// Returns the command name for `/name` or `/name@bot` messages.
    pub fn command(&self) -> Option<&str> {
        let name = self.command_token()?;
        let name = name.split('@').next().unwrap_or(name);
        if name.is_empty() { None } else { Some(name) }
    }

    /// Returns the bot a command is addressed to, `bot` in `/name@bot`.
    pub fn command_target(&self) -> Option<&str> {
        self.command()?;
        let (_, target) = self.command_token()?.split_once('@')?;
        if target.is_empty() { None } else { Some(target) }
    }

    fn command_token(&self) -> Option<&str> {
        self.text.split_whitespace().next()?.strip_prefix('/')
    }
}

/// How a reply should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    #[default]
    Plain,
    /// HTML markup with a selective force-reply keyboard
    HtmlForceReply,
}

/// Outgoing side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str, format: ReplyFormat) -> Result<()>;
}
