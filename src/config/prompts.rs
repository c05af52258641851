//! Prompt templates for Vidask.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.
//! Each pipeline builds its prompts through the typed methods on [`QaPrompts`] and
//! [`SummaryPrompts`] so the wording stays testable without a model.

use crate::conversation::{format_history, ChatMessage};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Marker the model returns when a transcript chunk cannot answer the question.
pub const NO_RELEVANT_INFO: &str = "NO_RELEVANT_INFO";

/// Prefix attached to answers that fell back to general knowledge.
pub const GENERAL_ANSWER_DISCLAIMER: &str =
    "⚠️ Note: This is a general answer as I couldn't find specific information in the video.\n\n";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for transcript question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    /// Asks whether one chunk answers the question.
    pub probe: String,
    /// General-knowledge answer when no chunk was relevant.
    pub general: String,
    /// Fuses several chunk answers into one.
    pub combine: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            probe: r#"Based on this video transcript excerpt and the previous conversation, please answer the following question. If the answer isn't in this excerpt, respond with "NO_RELEVANT_INFO".

Previous conversation:
{{history}}

Transcript excerpt:
{{chunk}}

Current question: {{question}}

Answer:"#
                .to_string(),

            general: r#"Based on our previous conversation:
{{history}}

The user asked: "{{question}}"

Since I couldn't find specific information about this in the video transcript, I'll provide a general answer based on my knowledge and our conversation context.

Please provide a helpful response that:
1. Acknowledges this is a general answer (not from the video)
2. Considers the context of our previous conversation
3. Gives relevant information about the topic
4. Stays factual and informative

Response:"#
                .to_string(),

            combine: r#"Create a clear and concise answer by combining these relevant pieces of information about the question: {{question}}

Information pieces:
{{answers}}"#
                .to_string(),
        }
    }
}

/// Prompts for video summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Summarizes one transcript chunk.
    pub chunk: String,
    /// Merges section summaries into one.
    pub combine: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            chunk: r#"Summarize this YouTube video transcript in the same language as the transcript. Focus on the most important points and provide a concise summary. Use headings and emojis to make it more engaging. Format the summary neatly.

Example format:
📌 **Main Points**:
- Point 1
- Point 2

💡 **Key Takeaways**:
- Takeaway 1
- Takeaway 2

🎯 **Conclusion**:
- Final thought

Transcript:
{{transcript}}"#
                .to_string(),

            combine: r#"Create a cohesive summary from these sections. Use the same language as the transcript. Focus on the most important points and provide a concise summary. Use headings and emojis to make it more engaging. Format the summary neatly.

Sections:
{{sections}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass over the template, so
    /// substituted values are never scanned again. Unknown placeholders are kept.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER_REGEX
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Prompt asking whether `chunk` answers `question`, given the conversation so far.
    pub fn probe(&self, chunk: &str, question: &str, history: &[ChatMessage]) -> String {
        let vars = HashMap::from([
            ("history".to_string(), format_history(history)),
            ("chunk".to_string(), chunk.to_string()),
            ("question".to_string(), question.to_string()),
        ]);
        self.render_with_custom(&self.qa.probe, &vars)
    }

    /// Prompt for a general-knowledge answer when the transcript has nothing relevant.
    pub fn general_answer(&self, question: &str, history: &[ChatMessage]) -> String {
        let vars = HashMap::from([
            ("history".to_string(), format_history(history)),
            ("question".to_string(), question.to_string()),
        ]);
        self.render_with_custom(&self.qa.general, &vars)
    }

    /// Prompt fusing several chunk answers, each labeled `Info N:`.
    pub fn combine_answers(&self, question: &str, answers: &[String]) -> String {
        let vars = HashMap::from([
            ("question".to_string(), question.to_string()),
            ("answers".to_string(), numbered_sections("Info", answers)),
        ]);
        self.render_with_custom(&self.qa.combine, &vars)
    }

    /// Prompt summarizing one transcript chunk.
    pub fn summarize_chunk(&self, transcript: &str) -> String {
        let vars = HashMap::from([("transcript".to_string(), transcript.to_string())]);
        self.render_with_custom(&self.summary.chunk, &vars)
    }

    /// Prompt merging section summaries, each labeled `Section N:`.
    pub fn combine_summaries(&self, sections: &[String]) -> String {
        let vars = HashMap::from([("sections".to_string(), numbered_sections("Section", sections))]);
        self.render_with_custom(&self.summary.combine, &vars)
    }
}

/// `Label 1:\n<text>` blocks separated by blank lines.
fn numbered_sections(label: &str, items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{} {}:\n{}", label, i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
