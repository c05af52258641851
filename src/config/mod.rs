//! Configuration module for Vidask.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    Prompts, QaPrompts, SummaryPrompts, GENERAL_ANSWER_DISCLAIMER, NO_RELEVANT_INFO,
};
pub use settings::{
    CacheSettings, GeneralSettings, LlmSettings, PromptSettings, QaSettings, ServerSettings,
    Settings, SummarySettings, YoutubeSettings,
};
