//! Data models for video transcripts.

use serde::{Deserialize, Serialize};

/// Width of the intervals used by the grouped transcript view.
pub const DEFAULT_GROUP_SECONDS: u32 = 30;

/// A complete transcript with segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Video title, when the provider knows it.
    pub title: Option<String>,
    /// Individual transcript segments, time-ordered as provided.
    pub segments: Vec<TranscriptSegment>,
    /// Full transcript text (concatenated segments).
    pub full_text: String,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(video_id: String, title: Option<String>, segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let duration_seconds = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);

        Self {
            video_id,
            title,
            segments,
            full_text,
            duration_seconds,
        }
    }

    /// Whether there is any spoken text at all.
    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }

    /// Group segments into fixed-width time intervals for display.
    pub fn grouped(&self, interval_seconds: u32) -> Vec<TimeRangeGroup> {
        group_by_interval(&self.segments, interval_seconds)
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Spoken text in this interval.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }
}

/// Transcript text gathered into one display interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeGroup {
    /// "MM:SS - MM:SS".
    pub time_range: String,
    pub text: String,
    #[serde(skip)]
    pub start_seconds: u32,
}

/// Group segments by the interval their start time falls in.
///
/// Groups appear in order of first occurrence; a segment always joins the group
/// for `floor(start / interval) * interval`, even if an earlier group is reopened.
pub fn group_by_interval(segments: &[TranscriptSegment], interval_seconds: u32) -> Vec<TimeRangeGroup> {
    let interval = interval_seconds.max(1);
    let mut groups: Vec<(u32, Vec<&str>)> = Vec::new();

    for segment in segments {
        let start = (segment.start_seconds.max(0.0) as u32 / interval) * interval;
        match groups.iter_mut().find(|(s, _)| *s == start) {
            Some((_, texts)) => texts.push(&segment.text),
            None => groups.push((start, vec![&segment.text])),
        }
    }

    groups
        .into_iter()
        .map(|(start, texts)| TimeRangeGroup {
            time_range: format!(
                "{} - {}",
                format_clock(start as f64),
                format_clock((start + interval) as f64)
            ),
            text: texts.join(" ").split_whitespace().collect::<Vec<_>>().join(" "),
            start_seconds: start,
        })
        .collect()
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Format seconds as total minutes and seconds (MM:SS), minutes not wrapping at the hour.
fn format_clock(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
