//! Clip resources handed to the matching stage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::clip::Region;
use crate::video::FrameSize;

/// One reusable clip as seen by text-video matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipResource {
    /// 1-based index of the source video.
    pub video_index: u32,
    pub resource_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Areas to keep clear when placing new captions.
    pub valid_region: Vec<Region>,
    pub frame_size: FrameSize,
    pub is_begin_clip: bool,
    pub is_end_clip: bool,
    /// Clip-level OCR detections serialized as a JSON array.
    pub ocr_json: String,
}

impl ClipResource {
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
