//! Stage runner request and output documents.

use std::collections::HashMap;

use montage_models::{FrameSize, RenderResult, ScriptShot, SourceVideo, VideoId};
use serde::{Deserialize, Serialize};

use crate::classify::VideoDetections;
use crate::error::{WorkerError, WorkerResult};
use crate::matcher::MatchContext;
use crate::timeline::MainTrack;

fn default_resolution() -> FrameSize {
    FrameSize::new(720, 1280)
}

/// Everything needed to assemble one montage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MontageRequest {
    pub request_id: String,
    #[serde(default)]
    pub request_tag: String,
    #[serde(default)]
    pub fixed_caption: Option<String>,
    #[serde(default)]
    pub first_industry_name: Option<String>,
    #[serde(default)]
    pub second_industry_name: Option<String>,
    /// Candidate videos, ordered by `video_index`.
    pub videos: Vec<SourceVideo>,
    /// OCR and subtitle detections per video.
    #[serde(default)]
    pub detections: HashMap<VideoId, VideoDetections>,
    pub shots: Vec<ScriptShot>,
    #[serde(default = "default_resolution")]
    pub resolution: FrameSize,
}

impl MontageRequest {
    /// Check the request before any service is called.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.request_id.trim().is_empty() {
            return Err(WorkerError::invalid_request("request_id is empty"));
        }
        if self.videos.is_empty() {
            return Err(WorkerError::invalid_request("no candidate videos"));
        }
        for (position, video) in self.videos.iter().enumerate() {
            if video.video_index as usize != position + 1 {
                return Err(WorkerError::invalid_request(format!(
                    "video {} has index {}, expected {}",
                    video.id,
                    video.video_index,
                    position + 1
                )));
            }
        }
        Ok(())
    }

    pub fn match_context(&self) -> MatchContext {
        MatchContext {
            request_id: self.request_id.clone(),
            request_tag: self.request_tag.clone(),
            fixed_caption: self.fixed_caption.clone(),
            first_industry_name: self.first_industry_name.clone(),
            second_industry_name: self.second_industry_name.clone(),
        }
    }
}

/// Output of a montage run, handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub request_id: String,
    /// Shot clips cut over all videos.
    pub clip_count: usize,
    /// Clip resources offered to matching.
    pub resource_count: usize,
    pub results: Vec<RenderResult>,
    pub main_track: MainTrack,
}
