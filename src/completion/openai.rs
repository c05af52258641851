//! OpenAI chat-completion implementation.

use super::CompletionService;
use crate::config::LlmSettings;
use crate::conversation::{ChatMessage, Role};
use crate::error::{Result, VidaskError};
use crate::openai::create_client;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Completion service backed by any OpenAI-compatible chat endpoint.
pub struct OpenAICompletion {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAICompletion {
    /// Create a completion service from explicit LLM settings.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
        })
    }

    fn to_request_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .iter()
            .map(|msg| {
                let message: ChatCompletionRequestMessage = match msg.role {
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.content.clone())
                        .build()
                        .map_err(map_openai_error)?
                        .into(),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(msg.content.clone())
                        .build()
                        .map_err(map_openai_error)?
                        .into(),
                };
                Ok(message)
            })
            .collect()
    }
}

#[async_trait]
impl CompletionService for OpenAICompletion {
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(Self::to_request_messages(messages)?)
            .build()
            .map_err(map_openai_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(VidaskError::EmptyResponse)?;

        debug!("Completion returned {} chars", content.len());
        Ok(content)
    }
}

/// Classify an OpenAI client error; network failures and server-side errors are retryable.
fn map_openai_error(error: OpenAIError) -> VidaskError {
    let retryable = match &error {
        OpenAIError::Reqwest(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        }
        OpenAIError::ApiError(api) => api
            .r#type
            .as_deref()
            .is_some_and(|t| t == "server_error" || t == "requests" || t == "tokens"),
        _ => false,
    };

    let message = format!("Chat API error: {}", error);
    if retryable {
        VidaskError::transient_completion(message)
    } else {
        VidaskError::completion(message)
    }
}
