//! OpenAI client configuration built from explicit settings.

use crate::config::LlmSettings;
use crate::error::{Result, VidaskError};
use async_openai::{config::OpenAIConfig, Client};

/// Create an OpenAI client for the configured endpoint, key and timeout.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(settings.timeout())
        .build()
        .map_err(|e| VidaskError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_base(&settings.api_base);
    if let Some(key) = settings.api_key.as_deref() {
        config = config.with_api_key(key);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
