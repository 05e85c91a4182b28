//! Long-polling loop that feeds chat updates into the dispatcher.

use async_trait::async_trait;
use relay_core::Result;
use relay_core::chat::IncomingMessage;
use relay_interaction::TelegramClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::CommandDispatcher;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// A batch of updates: the next offset to ask for, plus the usable messages.
#[derive(Debug, Default)]
pub struct UpdateBatch {
    pub next_offset: Option<i64>,
    pub messages: Vec<IncomingMessage>,
}

/// Source of incoming messages.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn poll(&self, offset: Option<i64>, timeout_secs: u64) -> Result<UpdateBatch>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn poll(&self, offset: Option<i64>, timeout_secs: u64) -> Result<UpdateBatch> {
        let updates = self.get_updates(offset, timeout_secs).await?;
        let next_offset = updates.iter().map(|u| u.update_id + 1).max();
        Ok(UpdateBatch {
            next_offset,
            messages: updates.into_iter().filter_map(|u| u.into_incoming()).collect(),
        })
    }
}

pub struct PollingLoop {
    source: Arc<dyn UpdateSource>,
    dispatcher: Arc<CommandDispatcher>,
    poll_timeout_secs: u64,
    retry_delay: Duration,
}

impl PollingLoop {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        dispatcher: Arc<CommandDispatcher>,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            source,
            dispatcher,
            poll_timeout_secs,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Initial delay after a failed poll; doubles up to a minute.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Polls until `shutdown` resolves. Each message is handled on its own task.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset = None;
        let mut backoff = self.retry_delay;
        tracing::info!("[Polling] Started");

        loop {
            let batch = tokio::select! {
                _ = &mut shutdown => break,
                batch = self.source.poll(offset, self.poll_timeout_secs) => batch,
            };

            match batch {
                Ok(batch) => {
                    backoff = self.retry_delay;
                    if batch.next_offset.is_some() {
                        offset = batch.next_offset;
                    }
                    for message in batch.messages {
                        self.spawn_handler(message);
                    }
                }
                Err(e) => {
                    tracing::warn!("[Polling] Fetching updates failed: {}, retrying in {:?}", e, backoff);
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }

        tracing::info!("[Polling] Stopped");
    }

    fn spawn_handler(&self, message: IncomingMessage) {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            match dispatcher.handle(&message).await {
                Ok(dispatch) => tracing::debug!(
                    "[Polling] Message {} from user {} handled as {:?}",
                    message.message_id,
                    message.from.id,
                    dispatch
                ),
                Err(e) => tracing::error!(
                    "[Polling] Failed to handle message {} from user {}: {}",
                    message.message_id,
                    message.from.id,
                    e
                ),
            }
        });
    }
}
