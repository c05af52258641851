//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidaskError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions needs captions and the model.
    Ask,
    /// Summaries need captions and the model.
    Summarize,
    /// The server serves every operation.
    Serve,
    /// Transcripts only need captions.
    Transcript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask | Operation::Summarize | Operation::Serve => {
            check_api_key(settings)?;
            check_tool(&settings.youtube.ytdlp_path)?;
        }
        Operation::Transcript => {
            check_tool(&settings.youtube.ytdlp_path)?;
        }
    }
    Ok(())
}

/// Check that an API key was configured or picked up from the environment.
fn check_api_key(settings: &Settings) -> Result<()> {
    if settings.llm.has_api_key() {
        Ok(())
    } else {
        Err(VidaskError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidaskError::ToolFailed(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidaskError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidaskError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_fails() {
        let settings = Settings::default();
        assert!(matches!(
            check(Operation::Ask, &settings),
            Err(VidaskError::Config(_))
        ));
    }

    #[test]
    fn test_missing_tool_reported() {
        let mut settings = Settings::default();
        settings.youtube.ytdlp_path = "vidask-no-such-tool".to_string();
        assert!(matches!(
            check(Operation::Transcript, &settings),
            Err(VidaskError::ToolNotFound(_))
        ));
    }
}
