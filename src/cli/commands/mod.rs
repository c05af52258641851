//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod serve;
mod summarize;
mod transcript;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use serve::{build_router, run_serve};
pub use summarize::run_summarize;
pub use transcript::run_transcript;

use crate::error::{Result, VidaskError};
use crate::transcript::extract_video_id;

/// Resolve a YouTube URL or bare ID given on the command line.
fn resolve_video_id(input: &str) -> Result<String> {
    extract_video_id(input)
        .ok_or_else(|| VidaskError::InvalidInput(format!("Not a YouTube URL or video ID: {}", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_video_id() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert!(matches!(
            resolve_video_id("not a video"),
            Err(VidaskError::InvalidInput(_))
        ));
    }
}
