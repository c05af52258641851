//! Transcript command implementation.

use super::resolve_video_id;
use crate::assistant::VideoAssistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::format_timestamp;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(video: &str, json: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let video_id = resolve_video_id(video)?;
    let assistant = VideoAssistant::new(&settings)?;
    let view = assistant.transcript(&video_id).await?;

    if json {
        let out = serde_json::json!({
            "title": view.title,
            "segments": view.groups,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    Output::header(view.title.as_deref().unwrap_or(&video_id));
    Output::kv("Duration", &format_timestamp(view.duration_seconds));
    println!();
    for group in &view.groups {
        Output::transcript_group(group);
    }

    Ok(())
}
