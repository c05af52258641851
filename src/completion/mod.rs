//! Language-model completion service.
//!
//! Pipelines talk to the model only through [`CompletionService`], a stateless
//! request/response call over a list of conversation turns.

mod openai;
mod retry;
mod scripted;

pub use openai::OpenAICompletion;
pub use retry::{RetryPolicy, RetryingCompletion};
pub use scripted::ScriptedCompletion;

use crate::config::LlmSettings;
use crate::conversation::ChatMessage;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for chat-completion backends.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete the conversation in `messages` with `model`, returning the reply text.
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String>;
}

#[async_trait]
impl<C: CompletionService + ?Sized> CompletionService for Arc<C> {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        (**self).complete(messages, model).await
    }
}

/// Create the OpenAI-backed completion service, wrapped in the configured retry policy.
pub fn create_completion_service(settings: &LlmSettings) -> Result<Arc<dyn CompletionService>> {
    let inner = OpenAICompletion::new(settings)?;
    let policy = RetryPolicy::new(settings.max_retries, settings.retry_base_delay());
    Ok(Arc::new(RetryingCompletion::new(inner, policy)))
}
