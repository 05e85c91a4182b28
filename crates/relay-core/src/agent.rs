//! Completion agent abstraction.

use async_trait::async_trait;

use crate::error::Result;

/// Sends a single user prompt to a language model and returns its answer.
#[async_trait]
pub trait CompletionAgent: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
