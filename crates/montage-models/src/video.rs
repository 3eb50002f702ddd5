//! Source video models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of a candidate source video within one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Pixel dimensions of a video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bounding box covering the whole frame.
    pub fn full_frame_bbox(&self) -> [f64; 4] {
        [0.0, 0.0, self.width as f64, self.height as f64]
    }

    /// Number of pixels in the frame.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

fn default_origin() -> String {
    "private".to_string()
}

/// A raw candidate video that shot clips are cut from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceVideo {
    pub id: VideoId,

    /// 1-based position of the video among the request's candidates.
    /// Matching responses and clip resources refer to videos by this index.
    pub video_index: u32,

    /// Blob resource id of the full video.
    pub resource_id: String,

    pub duration_ms: i64,

    pub width: u32,

    pub height: u32,

    /// Local copy of the video, required only when long shots are split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,

    /// Where the footage came from (e.g. "private", "public").
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl SourceVideo {
    pub fn new(
        id: impl Into<VideoId>,
        video_index: u32,
        resource_id: impl Into<String>,
        duration_ms: i64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            video_index,
            resource_id: resource_id.into(),
            duration_ms,
            width,
            height,
            local_path: None,
            origin: default_origin(),
        }
    }

    /// Attach the local file used for secondary splitting.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// 0-based position used by renderer entries.
    pub fn render_index(&self) -> usize {
        self.video_index.saturating_sub(1) as usize
    }
}
