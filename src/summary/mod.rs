//! Video summaries.
//!
//! Each transcript chunk is summarized on its own, then the section summaries
//! are merged with one more call. Caching lives outside the summarizer, in
//! [`cache`], and is applied by the caller.

pub mod cache;

pub use cache::{create_cache, summary_key, CachedSummary, MemoryCache, SqliteCache, SummaryCache};

use crate::chunking::chunk_transcript;
use crate::completion::CompletionService;
use crate::config::Prompts;
use crate::conversation::ChatMessage;
use crate::error::{Result, VidaskError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Produces a formatted summary of a transcript.
pub struct Summarizer {
    completion: Arc<dyn CompletionService>,
    prompts: Prompts,
    model: String,
    max_chunk_tokens: usize,
    request_timeout: Duration,
}

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

impl Summarizer {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        prompts: Prompts,
        model: &str,
        max_chunk_tokens: usize,
    ) -> Self {
        Self {
            completion,
            prompts,
            model: model.to_string(),
            max_chunk_tokens,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the whole-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Summarize a transcript.
    ///
    /// One call per chunk, plus one combine call when there is more than one chunk.
    /// The whole request is bounded by the configured deadline.
    #[instrument(skip(self, transcript_text), fields(chars = transcript_text.len()))]
    pub async fn summarize(&self, transcript_text: &str) -> Result<String> {
        tokio::time::timeout(self.request_timeout, self.summarize_inner(transcript_text))
            .await
            .map_err(|_| VidaskError::Timeout(self.request_timeout))?
    }

    async fn summarize_inner(&self, transcript_text: &str) -> Result<String> {
        let chunks = chunk_transcript(transcript_text, self.max_chunk_tokens);
        if chunks.is_empty() {
            return Err(VidaskError::InvalidInput("Transcript is empty".to_string()));
        }
        info!("Summarizing {} transcript chunks", chunks.len());

        let mut summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let prompt = self.prompts.summarize_chunk(chunk);
            let summary = self
                .completion
                .complete(&[ChatMessage::user(prompt)], &self.model)
                .await?;
            debug!("Summarized chunk {}/{}", i + 1, chunks.len());
            summaries.push(summary);
        }

        if summaries.len() == 1 {
            return Ok(summaries.remove(0));
        }

        let prompt = self.prompts.combine_summaries(&summaries);
        self.completion
            .complete(&[ChatMessage::user(prompt)], &self.model)
            .await
    }
}
