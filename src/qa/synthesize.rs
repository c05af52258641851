//! Fusing per-chunk answers into the final answer.

use crate::completion::CompletionService;
use crate::config::{Prompts, GENERAL_ANSWER_DISCLAIMER};
use crate::conversation::{with_prompt, ChatMessage};
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Merges relevant chunk answers into a single reply.
///
/// | candidates | model calls | result |
/// |---|---|---|
/// | 0 | 1 (history + general prompt) | disclaimer + general answer |
/// | 1 | 0 | the candidate, verbatim |
/// | >1 | 1 (combine prompt only) | the fused reply, unmodified |
pub struct AnswerSynthesizer {
    completion: Arc<dyn CompletionService>,
    prompts: Prompts,
    model: String,
}

impl AnswerSynthesizer {
    pub fn new(completion: Arc<dyn CompletionService>, prompts: Prompts, model: &str) -> Self {
        Self {
            completion,
            prompts,
            model: model.to_string(),
        }
    }

    pub async fn synthesize(
        &self,
        candidates: Vec<String>,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        match candidates.len() {
            0 => {
                info!("No relevant transcript chunk, falling back to a general answer");
                let prompt = self.prompts.general_answer(question, history);
                let reply = self
                    .completion
                    .complete(&with_prompt(history, prompt), &self.model)
                    .await?;
                Ok(format!("{}{}", GENERAL_ANSWER_DISCLAIMER, reply))
            }
            1 => Ok(candidates.into_iter().next().unwrap_or_default()),
            n => {
                info!("Combining {} relevant answers", n);
                // Combining is pure synthesis, so the history is left out.
                let prompt = self.prompts.combine_answers(question, &candidates);
                self.completion
                    .complete(&[ChatMessage::user(prompt)], &self.model)
                    .await
            }
        }
    }
}
