//! Shot clip and clip validity models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::detection::{BBox, Detection};
use crate::error::{ModelError, ModelResult};
use crate::video::VideoId;

/// A contiguous sub-interval of a source video used as one editing unit.
///
/// Times are absolute in the source video's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ShotClip {
    pub video_id: VideoId,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Playable sub-resource for this clip.
    pub resource_id: String,
    /// 1-based position of the clip within its video.
    pub sequence_index: u32,
}

impl ShotClip {
    /// Create a clip, rejecting empty or inverted windows.
    pub fn new(
        video_id: impl Into<VideoId>,
        start_ms: i64,
        end_ms: i64,
        resource_id: impl Into<String>,
        sequence_index: u32,
    ) -> ModelResult<Self> {
        if end_ms <= start_ms {
            return Err(ModelError::InvalidWindow { start_ms, end_ms });
        }
        Ok(Self {
            video_id: video_id.into(),
            start_ms,
            end_ms,
            resource_id: resource_id.into(),
            sequence_index,
        })
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn start_secs(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_secs(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }
}

/// Per-video clip sequence counters for one request.
///
/// Passed explicitly through segmentation so numbering never leaks between
/// requests.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounters {
    counters: HashMap<VideoId, u32>,
}

impl SequenceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter for `video_id` and return the new 1-based index.
    pub fn next(&mut self, video_id: &VideoId) -> u32 {
        let counter = self.counters.entry(video_id.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Number of clips numbered so far for `video_id`.
    pub fn count(&self, video_id: &VideoId) -> u32 {
        self.counters.get(video_id).copied().unwrap_or(0)
    }
}

/// Why a clip was judged unsafe to reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    #[default]
    None,
    BigText,
    CenterText,
    OvermuchText,
    OvermuchSubtitle,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::None => "none",
            InvalidReason::BigText => "big_text",
            InvalidReason::CenterText => "center_text",
            InvalidReason::OvermuchText => "overmuch_text",
            InvalidReason::OvermuchSubtitle => "overmuch_subtitle",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A screen area over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    pub start_ms: i64,
    pub end_ms: i64,
    pub bbox: BBox,
}

impl From<&Detection> for Region {
    fn from(det: &Detection) -> Self {
        Self {
            start_ms: det.start_ms,
            end_ms: det.end_ms,
            bbox: det.bbox,
        }
    }
}

/// Screen area that new captions or overlays must avoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidSubtitleRegion {
    /// True when the regions are the clip's own subtitles; false when the
    /// whole frame is reported instead.
    pub is_subtitle: bool,
    pub regions: Vec<Region>,
}

/// Outcome of classifying one shot clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipValidity {
    pub clip: ShotClip,
    pub valid: bool,
    pub invalid_reason: InvalidReason,
    /// Absent when the clip had no detection data at all.
    pub valid_subtitle_region: Option<ValidSubtitleRegion>,
    /// OCR detections clamped to the clip window.
    #[serde(default)]
    pub clip_ocr: Vec<Detection>,
    /// Subtitle detections clamped to the clip window.
    #[serde(default)]
    pub clip_subtitles: Vec<Detection>,
}

impl ClipValidity {
    /// A valid verdict for a clip without any detection data.
    pub fn unannotated(clip: ShotClip) -> Self {
        Self {
            clip,
            valid: true,
            invalid_reason: InvalidReason::None,
            valid_subtitle_region: None,
            clip_ocr: Vec::new(),
            clip_subtitles: Vec::new(),
        }
    }
}
