//! Summarize command implementation.

use super::resolve_video_id;
use crate::assistant::VideoAssistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(video: &str, use_cache: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Summarize, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let video_id = resolve_video_id(video)?;
    let assistant = VideoAssistant::new(&settings)?;

    let spinner = Output::spinner("Summarizing video...");
    let result = assistant.summarize(&video_id, use_cache).await;
    spinner.finish_and_clear();

    match result {
        Ok(summary) => {
            println!("\n{}\n", summary);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to generate summary: {}", e));
            Err(e.into())
        }
    }
}
