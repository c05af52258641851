//! Per-chunk relevance probing.

use crate::completion::CompletionService;
use crate::config::{Prompts, NO_RELEVANT_INFO};
use crate::conversation::{with_prompt, ChatMessage};
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// The model's verdict on one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkAnswer {
    /// The chunk answers the question; holds the trimmed answer text.
    Relevant(String),
    /// The model replied with the no-relevant-info marker.
    NotRelevant,
}

impl ChunkAnswer {
    /// Interpret a raw model reply.
    ///
    /// Only an exact, case-sensitive match of the trimmed reply against the
    /// marker counts as "not relevant"; `NO_RELEVANT_INFO.` is an answer.
    pub fn from_reply(reply: &str) -> Self {
        let trimmed = reply.trim();
        if trimmed == NO_RELEVANT_INFO {
            ChunkAnswer::NotRelevant
        } else {
            ChunkAnswer::Relevant(trimmed.to_string())
        }
    }

    pub fn into_answer(self) -> Option<String> {
        match self {
            ChunkAnswer::Relevant(answer) => Some(answer),
            ChunkAnswer::NotRelevant => None,
        }
    }
}

/// Asks the model whether a transcript chunk answers the current question.
pub struct RelevanceProber {
    completion: Arc<dyn CompletionService>,
    prompts: Prompts,
    model: String,
}

impl RelevanceProber {
    pub fn new(completion: Arc<dyn CompletionService>, prompts: Prompts, model: &str) -> Self {
        Self {
            completion,
            prompts,
            model: model.to_string(),
        }
    }

    /// Probe one chunk. Issues exactly one completion call with the history
    /// followed by the probe prompt; errors propagate unchanged.
    pub async fn probe(
        &self,
        chunk: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<ChunkAnswer> {
        let prompt = self.prompts.probe(chunk, question, history);
        let reply = self
            .completion
            .complete(&with_prompt(history, prompt), &self.model)
            .await?;

        let answer = ChunkAnswer::from_reply(&reply);
        debug!(relevant = matches!(answer, ChunkAnswer::Relevant(_)), "Probed chunk");
        Ok(answer)
    }
}
