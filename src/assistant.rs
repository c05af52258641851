//! Request-level coordination for Vidask.
//!
//! Fetches the transcript for a video and runs it through the question-answering
//! or summary pipeline, consulting the summary cache around the latter.

use crate::completion::{create_completion_service, CompletionService};
use crate::config::{Prompts, Settings};
use crate::conversation::ChatMessage;
use crate::error::{Result, VidaskError};
use crate::qa::QaPipeline;
use crate::summary::{create_cache, summary_key, CachedSummary, Summarizer, SummaryCache};
use crate::transcript::{
    TimeRangeGroup, Transcript, TranscriptProvider, YoutubeTranscriptProvider,
    DEFAULT_GROUP_SECONDS,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Transcript with segments grouped for display.
#[derive(Debug, Clone)]
pub struct TranscriptView {
    pub title: Option<String>,
    pub duration_seconds: f64,
    pub groups: Vec<TimeRangeGroup>,
}

/// Answers questions about videos and summarizes them.
pub struct VideoAssistant {
    transcripts: Arc<dyn TranscriptProvider>,
    qa: QaPipeline,
    summarizer: Summarizer,
    cache: Option<Arc<dyn SummaryCache>>,
    cache_ttl: Duration,
}

impl VideoAssistant {
    /// Create an assistant backed by YouTube captions and the configured model endpoint.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let completion = create_completion_service(&settings.llm)?;
        let transcripts = Arc::new(YoutubeTranscriptProvider::new(&settings.youtube));
        let cache = create_cache(settings)?;

        info!(
            "Using model {} at {} (cache: {})",
            settings.llm.model, settings.llm.api_base, settings.cache.provider
        );

        Ok(Self::with_components(settings, prompts, transcripts, completion, cache))
    }

    /// Create an assistant with custom components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        transcripts: Arc<dyn TranscriptProvider>,
        completion: Arc<dyn CompletionService>,
        cache: Option<Arc<dyn SummaryCache>>,
    ) -> Self {
        let qa = QaPipeline::new(completion.clone(), prompts.clone(), &settings.llm.model, &settings.qa);
        let summarizer = Summarizer::new(
            completion,
            prompts,
            settings.summary_model(),
            settings.summary.max_chunk_tokens,
        )
        .with_request_timeout(settings.summary.request_timeout());

        Self {
            transcripts,
            qa,
            summarizer,
            cache,
            cache_ttl: settings.summary.cache_ttl(),
        }
    }

    /// Fetch a transcript, treating one without any text as unavailable.
    async fn fetch_transcript(&self, video_id: &str) -> Result<Transcript> {
        let transcript = self.transcripts.fetch(video_id).await?;
        if transcript.is_empty() {
            return Err(VidaskError::TranscriptUnavailable(format!(
                "Transcript for {} has no text",
                video_id
            )));
        }
        Ok(transcript)
    }

    /// Answer a question about a video, given the conversation so far.
    #[instrument(skip(self, history), fields(turns = history.len()))]
    pub async fn answer(
        &self,
        video_id: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        if video_id.trim().is_empty() || question.trim().is_empty() {
            return Err(VidaskError::InvalidInput("Missing videoId or question".to_string()));
        }

        let transcript = self.fetch_transcript(video_id).await?;
        self.qa.answer(&transcript.full_text, question, history).await
    }

    /// Summarize a video, using the cache when `use_cache` is set.
    ///
    /// Cache failures are logged and otherwise ignored.
    #[instrument(skip(self))]
    pub async fn summarize(&self, video_id: &str, use_cache: bool) -> Result<String> {
        if video_id.trim().is_empty() {
            return Err(VidaskError::InvalidInput("Missing video ID".to_string()));
        }

        let key = summary_key(video_id);
        let cache = self.cache.as_ref().filter(|_| use_cache);

        if let Some(cache) = cache {
            match cache.get(&key).await {
                Ok(Some(raw)) => match serde_json::from_str::<CachedSummary>(&raw) {
                    Ok(cached) => {
                        info!("Summary for {} retrieved from cache", video_id);
                        return Ok(cached.summary);
                    }
                    Err(e) => warn!("Ignoring malformed cache entry {}: {}", key, e),
                },
                Ok(None) => {}
                Err(e) => warn!("Summary cache read failed: {}", e),
            }
        }

        let transcript = self.fetch_transcript(video_id).await?;
        let summary = self.summarizer.summarize(&transcript.full_text).await?;

        if let Some(cache) = cache {
            let payload = serde_json::to_string(&CachedSummary {
                summary: summary.clone(),
            })?;
            match cache.set(&key, &payload, self.cache_ttl).await {
                Ok(()) => info!("Summary for {} cached", video_id),
                Err(e) => warn!("Summary cache write failed: {}", e),
            }
        }

        Ok(summary)
    }

    /// Fetch a video's transcript grouped into 30-second intervals.
    #[instrument(skip(self))]
    pub async fn transcript(&self, video_id: &str) -> Result<TranscriptView> {
        if video_id.trim().is_empty() {
            return Err(VidaskError::InvalidInput("Missing video ID".to_string()));
        }

        let transcript = self.fetch_transcript(video_id).await?;
        Ok(TranscriptView {
            groups: transcript.grouped(DEFAULT_GROUP_SECONDS),
            duration_seconds: transcript.duration_seconds,
            title: transcript.title,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::completion::ScriptedCompletion;
    use crate::summary::MemoryCache;
    use crate::transcript::TranscriptSegment;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transcript provider serving a fixed transcript for one video ID.
    pub(crate) struct StaticTranscriptProvider {
        pub video_id: String,
        pub segments: Vec<TranscriptSegment>,
        pub fetches: AtomicUsize,
    }

    impl StaticTranscriptProvider {
        pub(crate) fn new(video_id: &str, texts: &[&str]) -> Self {
            let segments = texts
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    TranscriptSegment::new(i as f64 * 10.0, (i + 1) as f64 * 10.0, text.to_string())
                })
                .collect();
            Self {
                video_id: video_id.to_string(),
                segments,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscriptProvider for StaticTranscriptProvider {
        async fn fetch(&self, video_id: &str) -> Result<Transcript> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if video_id != self.video_id {
                return Err(VidaskError::TranscriptUnavailable(video_id.to_string()));
            }
            Ok(Transcript::new(
                video_id.to_string(),
                Some("Test Video".to_string()),
                self.segments.clone(),
            ))
        }
    }

    fn assistant(
        provider: Arc<StaticTranscriptProvider>,
        scripted: Arc<ScriptedCompletion>,
        cache: Option<Arc<dyn SummaryCache>>,
    ) -> VideoAssistant {
        VideoAssistant::with_components(&Settings::default(), Prompts::default(), provider, scripted, cache)
    }

    #[tokio::test]
    async fn test_answer_uses_transcript_text() {
        let provider = Arc::new(StaticTranscriptProvider::new("vid", &["the sky", "is blue"]));
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_reply("Blue.");

        let answer = assistant(provider, scripted.clone(), None)
            .answer("vid", "What color is the sky?", &[])
            .await
            .unwrap();

        assert_eq!(answer, "Blue.");
        assert!(scripted.calls()[0].prompt().contains("Transcript excerpt:\nthe sky is blue"));
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_fetch() {
        let provider = Arc::new(StaticTranscriptProvider::new("vid", &["text"]));
        let assistant = assistant(provider.clone(), Arc::new(ScriptedCompletion::new()), None);

        assert!(matches!(
            assistant.answer("", "q", &[]).await,
            Err(VidaskError::InvalidInput(_))
        ));
        assert!(matches!(
            assistant.summarize(" ", true).await,
            Err(VidaskError::InvalidInput(_))
        ));
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_and_empty_transcripts() {
        let provider = Arc::new(StaticTranscriptProvider::new("vid", &["  "]));
        let scripted = Arc::new(ScriptedCompletion::new());
        let assistant = assistant(provider, scripted.clone(), None);

        assert!(assistant.answer("other", "q", &[]).await.unwrap_err().is_not_found());
        assert!(assistant.answer("vid", "q", &[]).await.unwrap_err().is_not_found());
        assert_eq!(scripted.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_cached_between_requests() {
        let provider = Arc::new(StaticTranscriptProvider::new("vid", &["a", "b"]));
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_reply("summary");
        let cache: Arc<dyn SummaryCache> = Arc::new(MemoryCache::new());

        let assistant = assistant(provider.clone(), scripted.clone(), Some(cache.clone()));

        assert_eq!(assistant.summarize("vid", true).await.unwrap(), "summary");
        assert_eq!(assistant.summarize("vid", true).await.unwrap(), "summary");
        assert_eq!(scripted.call_count(), 1);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.get("video:vid:summary").await.unwrap().as_deref(),
            Some(r#"{"summary":"summary"}"#)
        );
    }

    #[tokio::test]
    async fn test_summary_bypasses_cache_when_disabled() {
        let provider = Arc::new(StaticTranscriptProvider::new("vid", &["a"]));
        let scripted = Arc::new(ScriptedCompletion::with_responder(|_| Ok("fresh".to_string())));
        let cache: Arc<dyn SummaryCache> = Arc::new(MemoryCache::new());
        cache
            .set("video:vid:summary", r#"{"summary":"stale"}"#, Duration::from_secs(60))
            .await
            .unwrap();

        let assistant = assistant(provider, scripted, Some(cache.clone()));

        assert_eq!(assistant.summarize("vid", false).await.unwrap(), "fresh");
        assert_eq!(assistant.summarize("vid", true).await.unwrap(), "stale");
    }

    #[tokio::test]
    async fn test_transcript_view() {
        let provider = Arc::new(StaticTranscriptProvider::new("vid", &["one", "two", "three", "four"]));
        let view = assistant(provider, Arc::new(ScriptedCompletion::new()), None)
            .transcript("vid")
            .await
            .unwrap();

        assert_eq!(view.title.as_deref(), Some("Test Video"));
        assert_eq!(view.duration_seconds, 40.0);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].text, "one two three");
        assert_eq!(view.groups[1].time_range, "00:30 - 01:00");
    }
}
