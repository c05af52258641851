//! YouTube transcript provider.
//!
//! Video metadata and the caption track list come from `yt-dlp --dump-json`;
//! the chosen track is then downloaded in YouTube's `json3` timed-text format.

use super::{Transcript, TranscriptProvider, TranscriptSegment};
use crate::config::YoutubeSettings;
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

static VIDEO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches various YouTube URL formats and bare video IDs
    Regex::new(
        r"(?x)
        (?:
            # Full YouTube URLs
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/|youtube\.com/live/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        # Bare video ID (11 characters)
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

/// Extract an 11-character video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Query parameters in any order, e.g. watch?feature=share&v=ID
    if let Ok(parsed) = url::Url::parse(input) {
        if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
            if let Some(caps) = VIDEO_ID_REGEX.captures(&v) {
                return caps.get(2).map(|m| m.as_str().to_string());
            }
        }
    }

    let caps = VIDEO_ID_REGEX.captures(input)?;

    // Try group 1 (URL format) then group 2 (bare ID)
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// A caption track chosen from yt-dlp metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language: String,
    pub url: String,
    /// Whether this is an automatic (speech-recognized) track.
    pub automatic: bool,
}

/// Transcript provider backed by yt-dlp and YouTube timed text.
pub struct YoutubeTranscriptProvider {
    ytdlp_path: String,
    languages: Vec<String>,
    http: reqwest::Client,
}

impl YoutubeTranscriptProvider {
    pub fn new(settings: &YoutubeSettings) -> Self {
        Self {
            ytdlp_path: settings.ytdlp_path.clone(),
            languages: settings.languages.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch video metadata (title and caption tracks) using yt-dlp.
    async fn fetch_metadata(&self, video_id: &str) -> Result<Value> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VidaskError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    VidaskError::VideoSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidaskError::VideoNotFound(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| VidaskError::VideoSource(format!("Failed to parse yt-dlp output: {}", e)))
    }
}

#[async_trait]
impl TranscriptProvider for YoutubeTranscriptProvider {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let video_id = extract_video_id(video_id).ok_or_else(|| {
            VidaskError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", video_id))
        })?;

        let metadata = self.fetch_metadata(&video_id).await?;
        let title = metadata["title"].as_str().map(|s| s.to_string());

        let track = select_caption_track(&metadata, &self.languages).ok_or_else(|| {
            VidaskError::TranscriptUnavailable(format!("No captions for video {}", video_id))
        })?;
        info!(
            "Using {} captions ({}) for {}",
            if track.automatic { "automatic" } else { "uploaded" },
            track.language,
            video_id
        );

        let body = self
            .http
            .get(&track.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_json3(&body)?;
        if segments.is_empty() {
            return Err(VidaskError::TranscriptUnavailable(format!(
                "Captions for video {} are empty",
                video_id
            )));
        }
        debug!("Parsed {} caption segments", segments.len());

        Ok(Transcript::new(video_id, title, segments))
    }
}

/// Choose a caption track.
///
/// Preference: uploaded tracks in a preferred language, automatic tracks in a
/// preferred language, any uploaded track, then the automatic track in the
/// video's original language (`*-orig`).
pub fn select_caption_track(metadata: &Value, languages: &[String]) -> Option<CaptionTrack> {
    let subtitles = &metadata["subtitles"];
    let automatic = &metadata["automatic_captions"];

    let preferred = |key: &str| {
        languages
            .iter()
            .any(|lang| key == lang.as_str() || key.starts_with(&format!("{}-", lang)))
    };

    find_track(subtitles, false, preferred)
        .or_else(|| find_track(automatic, true, preferred))
        .or_else(|| find_track(subtitles, false, |_| true))
        .or_else(|| find_track(automatic, true, |key| key.ends_with("-orig")))
}

fn find_track<F>(tracks: &Value, automatic: bool, matches: F) -> Option<CaptionTrack>
where
    F: Fn(&str) -> bool,
{
    let tracks = tracks.as_object()?;
    let mut languages: Vec<&String> = tracks.keys().filter(|k| matches(k)).collect();
    languages.sort();

    languages.into_iter().find_map(|language| {
        let url = tracks[language]
            .as_array()?
            .iter()
            .find(|format| format["ext"] == "json3")?["url"]
            .as_str()?;
        Some(CaptionTrack {
            language: language.clone(),
            url: url.to_string(),
            automatic,
        })
    })
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` caption document into segments, dropping events without text.
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let document: Json3Document = serde_json::from_str(body)?;

    Ok(document
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            let start = event.t_start_ms as f64 / 1000.0;
            let end = (event.t_start_ms + event.d_duration_ms) as f64 / 1000.0;
            Some(TranscriptSegment::new(start, end, text))
        })
        .collect())
}
