//! Transcript-grounded question answering.
//!
//! A question is answered by splitting the transcript into chunks, asking the
//! model about each chunk in turn, and fusing whatever relevant answers came
//! back. When no chunk is relevant the model answers from general knowledge
//! and the reply carries a disclaimer.

mod probe;
mod synthesize;

pub use probe::{ChunkAnswer, RelevanceProber};
pub use synthesize::AnswerSynthesizer;

use crate::chunking::chunk_transcript;
use crate::completion::CompletionService;
use crate::config::{Prompts, QaSettings};
use crate::conversation::ChatMessage;
use crate::error::{Result, VidaskError};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The full question-answering pipeline for one transcript.
pub struct QaPipeline {
    prober: RelevanceProber,
    synthesizer: AnswerSynthesizer,
    max_chunk_tokens: usize,
    max_concurrent_probes: usize,
    request_timeout: Duration,
}

impl QaPipeline {
    /// Create a pipeline from explicit settings.
    pub fn new(
        completion: Arc<dyn CompletionService>,
        prompts: Prompts,
        model: &str,
        settings: &QaSettings,
    ) -> Self {
        Self {
            prober: RelevanceProber::new(completion.clone(), prompts.clone(), model),
            synthesizer: AnswerSynthesizer::new(completion, prompts, model),
            max_chunk_tokens: settings.max_chunk_tokens,
            max_concurrent_probes: settings.max_concurrent_probes.max(1),
            request_timeout: settings.request_timeout(),
        }
    }

    /// Set how many chunks may be probed at once.
    pub fn with_max_concurrent_probes(mut self, n: usize) -> Self {
        self.max_concurrent_probes = n.max(1);
        self
    }

    /// Set the whole-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Answer `question` about `transcript_text`, given the conversation so far.
    ///
    /// Makes one model call per chunk plus at most one synthesis call. Any failure
    /// aborts the whole request; there is no partial answer.
    #[instrument(skip(self, transcript_text, history), fields(question = %question, turns = history.len()))]
    pub async fn answer(
        &self,
        transcript_text: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        if question.trim().is_empty() {
            return Err(VidaskError::InvalidInput("Question is empty".to_string()));
        }

        tokio::time::timeout(
            self.request_timeout,
            self.answer_inner(transcript_text, question, history),
        )
        .await
        .map_err(|_| VidaskError::Timeout(self.request_timeout))?
    }

    async fn answer_inner(
        &self,
        transcript_text: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        let chunks = chunk_transcript(transcript_text, self.max_chunk_tokens);
        info!("Probing {} transcript chunks", chunks.len());

        let candidates = self.relevant_answers(&chunks, question, history).await?;
        info!("{} of {} chunks were relevant", candidates.len(), chunks.len());

        self.synthesizer
            .synthesize(candidates, question, history)
            .await
    }

    /// Probe every chunk and keep the relevant answers in chunk order.
    ///
    /// `buffered` yields results in input order regardless of completion order,
    /// so concurrency never changes what reaches the synthesizer. The probe
    /// futures are built up front so the stream holds no borrowing closure,
    /// which keeps the returned future `Send` for any lifetime.
    async fn relevant_answers(
        &self,
        chunks: &[String],
        question: &str,
        history: &[ChatMessage],
    ) -> Result<Vec<String>> {
        let probes: Vec<_> = chunks
            .iter()
            .map(|chunk| self.prober.probe(chunk, question, history))
            .collect();

        let answers: Vec<ChunkAnswer> = stream::iter(probes)
            .buffered(self.max_concurrent_probes)
            .try_collect()
            .await?;

        Ok(answers.into_iter().filter_map(ChunkAnswer::into_answer).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::ScriptedCompletion;
    use crate::config::{GENERAL_ANSWER_DISCLAIMER, NO_RELEVANT_INFO};
    use crate::conversation::format_history;

    fn settings(max_chunk_tokens: usize) -> QaSettings {
        QaSettings {
            max_chunk_tokens,
            ..QaSettings::default()
        }
    }

    fn pipeline(scripted: &Arc<ScriptedCompletion>, max_chunk_tokens: usize) -> QaPipeline {
        QaPipeline::new(scripted.clone(), Prompts::default(), "m", &settings(max_chunk_tokens))
    }

    /// Twelve one-token words: two chunks under a budget of 10.
    fn two_chunk_transcript() -> String {
        (1..=12).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_end_to_end_single_relevant_chunk() {
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_reply(NO_RELEVANT_INFO);
        scripted.push_reply("X is Y");

        let answer = pipeline(&scripted, 10)
            .answer(&two_chunk_transcript(), "What is X?", &[])
            .await
            .unwrap();

        assert_eq!(answer, "X is Y");

        let calls = scripted.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].prompt().contains("w1 w2 w3 w4 w5 w6 w7 w8 w9 w10\n"));
        assert!(calls[1].prompt().contains("Transcript excerpt:\nw11 w12\n"));
    }

    #[tokio::test]
    async fn test_all_irrelevant_falls_back_once() {
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_reply(NO_RELEVANT_INFO);
        scripted.push_reply(NO_RELEVANT_INFO);
        scripted.push_reply("From general knowledge...");

        let answer = pipeline(&scripted, 10)
            .answer(&two_chunk_transcript(), "What is X?", &[])
            .await
            .unwrap();

        assert!(answer.starts_with(GENERAL_ANSWER_DISCLAIMER));
        assert_eq!(scripted.call_count(), 3);
    }

    #[tokio::test]
    async fn test_multiple_relevant_chunks_fused() {
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_reply("part one");
        scripted.push_reply("NO_RELEVANT_INFO.");
        scripted.push_reply("fused");

        let answer = pipeline(&scripted, 10)
            .answer(&two_chunk_transcript(), "q", &[])
            .await
            .unwrap();

        assert_eq!(answer, "fused");
        let calls = scripted.calls();
        assert_eq!(calls.len(), 3);
        // Punctuated marker is not the sentinel, so it is fused as an answer.
        assert!(calls[2].prompt().contains("Info 2:\nNO_RELEVANT_INFO."));
    }

    #[tokio::test]
    async fn test_history_primes_every_probe() {
        let history = vec![ChatMessage::user("Who hosts?"), ChatMessage::assistant("Sam.")];
        let expected = format_history(&history);
        let scripted = Arc::new(ScriptedCompletion::with_responder(|_| {
            Ok(NO_RELEVANT_INFO.to_string())
        }));

        pipeline(&scripted, 10)
            .answer(&two_chunk_transcript(), "And the guest?", &history)
            .await
            .unwrap();

        for call in scripted.calls() {
            assert_eq!(&call.messages[..2], &history[..]);
            assert!(call.prompt().contains(&expected));
        }
    }

    #[tokio::test]
    async fn test_failure_aborts_without_partial_answer() {
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_reply("chunk one answer");
        scripted.push_error(VidaskError::completion("quota exceeded"));

        let result = pipeline(&scripted, 10)
            .answer(&two_chunk_transcript(), "q", &[])
            .await;

        assert!(matches!(result, Err(VidaskError::Completion { .. })));
        assert_eq!(scripted.call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_probes_keep_chunk_order() {
        let scripted = Arc::new(ScriptedCompletion::with_responder(|messages| {
            let prompt = &messages.last().unwrap().content;
            if prompt.contains("Information pieces:") {
                return Ok(prompt.clone());
            }
            let excerpt = prompt
                .split("Transcript excerpt:\n")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .unwrap_or_default();
            Ok(format!("answer from {}", excerpt))
        }));

        let transcript = (1..=30).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let answer = pipeline(&scripted, 10)
            .with_max_concurrent_probes(4)
            .answer(&transcript, "fused please", &[])
            .await
            .unwrap();

        let first = answer.find("answer from w1\n").unwrap();
        let second = answer.find("answer from w11").unwrap();
        let third = answer.find("answer from w21").unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_answer_runs_on_spawned_task() {
        let scripted = Arc::new(ScriptedCompletion::with_responder(|_| Ok("answer".to_string())));
        let pipeline = pipeline(&scripted, 10).with_max_concurrent_probes(2);
        let history = vec![ChatMessage::user("earlier")];

        let answer = tokio::spawn(async move {
            pipeline
                .answer(&two_chunk_transcript(), "q", &history)
                .await
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(answer, "answer");
        assert_eq!(scripted.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let scripted = Arc::new(ScriptedCompletion::new());
        let result = pipeline(&scripted, 10).answer("some text", "  ", &[]).await;

        assert!(matches!(result, Err(VidaskError::InvalidInput(_))));
        assert_eq!(scripted.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        struct Stalled;

        #[async_trait::async_trait]
        impl CompletionService for Stalled {
            async fn complete(&self, _: &[ChatMessage], _: &str) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(String::new())
            }
        }

        let pipeline = QaPipeline::new(Arc::new(Stalled), Prompts::default(), "m", &settings(10))
            .with_request_timeout(Duration::from_millis(20));

        let result = pipeline.answer("some words", "q", &[]).await;
        assert!(matches!(result, Err(VidaskError::Timeout(_))));
    }
}
