//! ASR footage models for live-footage alignment.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One recognized utterance in the flattened ASR pool.
///
/// Times are seconds within the utterance's own source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AsrPoolEntry {
    pub text: String,
    pub start: f64,
    pub end: f64,
    /// 0-based index of the source video.
    pub video_index: usize,
}

/// An ASR utterance reused as caption text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AsrSnippet {
    pub video_index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl AsrSnippet {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A matched stretch of footage for one subtitle line.
///
/// The match may begin in one video and end in a later one; `start` is an
/// offset in `video_start_idx` and `end` an offset in `video_end_idx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeClip {
    pub asr_start_idx: usize,
    pub asr_end_idx: usize,
    pub video_start_idx: usize,
    pub video_end_idx: usize,
    pub start: f64,
    pub end: f64,
    /// ASR utterances used as captions for this clip.
    #[serde(default)]
    pub snippets: Vec<AsrSnippet>,
}

impl TimeClip {
    pub fn spans_videos(&self) -> bool {
        self.video_end_idx > self.video_start_idx
    }
}
