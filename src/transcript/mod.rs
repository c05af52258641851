//! Transcript retrieval for videos.
//!
//! Provides a trait-based interface so pipelines can run against YouTube
//! captions or any other source of timestamped text.

mod models;
mod youtube;

pub use models::{
    format_timestamp, group_by_interval, TimeRangeGroup, Transcript, TranscriptSegment,
    DEFAULT_GROUP_SECONDS,
};
pub use youtube::{extract_video_id, YoutubeTranscriptProvider};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch the transcript for a video.
    ///
    /// Fails with `TranscriptUnavailable` when the video has no usable transcript.
    async fn fetch(&self, video_id: &str) -> Result<Transcript>;
}
