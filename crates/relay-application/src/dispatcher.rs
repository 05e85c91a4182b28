//! CommandDispatcher - routes incoming chat messages.
//!
//! `/start` and `/help` get fixed replies, plain text is relayed to the completion
//! agent. Commands addressed to another bot (`/start@other_bot`) are ignored once
//! the bot's own username is known. Every handled message is recorded through the [`BackupPipeline`] before
//! the reply is sent, so a failed record means no reply.

use relay_core::action::{ACTION_ANSWER, ACTION_HELP, ACTION_START};
use relay_core::agent::CompletionAgent;
use relay_core::chat::{ChatTransport, ChatUser, IncomingMessage, ReplyFormat};
use relay_core::Result;
use std::sync::Arc;

use crate::backup_pipeline::BackupPipeline;

pub const HELP_TEXT: &str =
    "Бот для диалога с YandexGPT 5 с визуализацией статистических показателей посещений";

/// How a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Start,
    Help,
    Answer,
    Ignored,
}

pub struct CommandDispatcher {
    pipeline: Arc<BackupPipeline>,
    agent: Arc<dyn CompletionAgent>,
    transport: Arc<dyn ChatTransport>,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    pub fn new(
        pipeline: Arc<BackupPipeline>,
        agent: Arc<dyn CompletionAgent>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            pipeline,
            agent,
            transport,
            bot_username: None,
        }
    }

    /// Sets the bot's own username, as reported by the chat platform.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    fn addressed_elsewhere(&self, message: &IncomingMessage) -> bool {
        match (message.command_target(), self.bot_username.as_deref()) {
            (Some(target), Some(own)) => !target.eq_ignore_ascii_case(own),
            _ => false,
        }
    }

    pub async fn handle(&self, message: &IncomingMessage) -> Result<Dispatch> {
        if self.addressed_elsewhere(message) {
            tracing::debug!(
                "[Dispatcher] Ignoring command for @{}",
                message.command_target().unwrap_or_default()
            );
            return Ok(Dispatch::Ignored);
        }

        let dispatch = match message.command() {
            Some("start") => Dispatch::Start,
            Some("help") => Dispatch::Help,
            Some(other) => {
                tracing::debug!("[Dispatcher] Ignoring unknown command /{}", other);
                return Ok(Dispatch::Ignored);
            }
            None => Dispatch::Answer,
        };

        let action = match dispatch {
            Dispatch::Start => ACTION_START,
            Dispatch::Help => ACTION_HELP,
            _ => ACTION_ANSWER,
        };
        self.pipeline
            .record(message.from.id, action, message.date.fixed_offset())
            .await?;

        match dispatch {
            Dispatch::Start => {
                self.transport
                    .send_message(
                        message.chat_id,
                        &greeting(&message.from),
                        ReplyFormat::HtmlForceReply,
                    )
                    .await?
            }
            Dispatch::Help => {
                self.transport
                    .send_message(message.chat_id, HELP_TEXT, ReplyFormat::Plain)
                    .await?
            }
            _ => {
                let answer = self.agent.complete(&message.text).await?;
                self.transport
                    .send_message(message.chat_id, &answer, ReplyFormat::Plain)
                    .await?
            }
        }

        Ok(dispatch)
    }
}

/// Greeting for `/start` with an HTML mention of the user.
pub fn greeting(user: &ChatUser) -> String {
    format!(
        "Здравствуйте {}! Всё готово для доступа к YandexGPT 5",
        mention_html(user)
    )
}

fn mention_html(user: &ChatUser) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user.id,
        escape_html(&user.full_name())
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
