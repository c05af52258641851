//! Error types for Vidask.

use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Vidask operations.
#[derive(Error, Debug)]
pub enum VidaskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Transcript not available: {0}")]
    TranscriptUnavailable(String),

    #[error("Video source error: {0}")]
    VideoSource(String),

    #[error("Completion failed: {message}")]
    Completion { message: String, retryable: bool },

    #[error("Empty response from language model")]
    EmptyResponse,

    #[error("Request exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl VidaskError {
    /// Build a completion error that should not be retried.
    pub fn completion(message: impl Into<String>) -> Self {
        VidaskError::Completion {
            message: message.into(),
            retryable: false,
        }
    }

    /// Build a completion error caused by a transient condition (network, rate limit).
    pub fn transient_completion(message: impl Into<String>) -> Self {
        VidaskError::Completion {
            message: message.into(),
            retryable: true,
        }
    }

    /// Whether retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VidaskError::Completion { retryable: true, .. })
    }

    /// Whether the error means the video or its transcript could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VidaskError::VideoNotFound(_) | VidaskError::TranscriptUnavailable(_)
        )
    }
}

/// Result type alias for Vidask operations.
pub type Result<T> = std::result::Result<T, VidaskError>;
