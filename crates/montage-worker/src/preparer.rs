//! Conversion of annotated clips into matching candidates.

use montage_models::{ClipResource, ClipValidity, Region, ScriptShot, SourceVideo};
use tracing::{debug, warn};

use crate::classify::AnnotatedVideo;
use crate::config::PreparerConfig;

/// Turns validity verdicts into the clip resources offered to matching.
#[derive(Debug, Clone, Default)]
pub struct ClipResourcePreparer {
    config: PreparerConfig,
}

impl ClipResourcePreparer {
    pub fn new(config: PreparerConfig) -> Self {
        Self { config }
    }

    /// Build one resource per usable clip, videos and clips in input order.
    ///
    /// Begin/end tags are decided against every clip of the video, including
    /// ones filtered out as invalid.
    pub fn prepare(&self, videos: &[AnnotatedVideo]) -> Vec<ClipResource> {
        let mut resources = Vec::new();
        for annotated in videos {
            let clip_count = annotated.clips.len() as u32;
            for verdict in &annotated.clips {
                if !verdict.valid && !self.config.keep_invalid_clips {
                    continue;
                }
                resources.push(self.resource_for(&annotated.video, verdict, clip_count));
            }
        }
        debug!(resources = resources.len(), "Prepared clip resources");
        resources
    }

    fn resource_for(&self, video: &SourceVideo, verdict: &ClipValidity, clip_count: u32) -> ClipResource {
        let clip = &verdict.clip;
        let tagged = clip_count > self.config.begin_end_clip_min_count;
        let frame_size = video.frame_size();

        let valid_region = match &verdict.valid_subtitle_region {
            Some(region) => region.regions.clone(),
            None => vec![Region {
                start_ms: clip.start_ms,
                end_ms: clip.end_ms,
                bbox: frame_size.full_frame_bbox(),
            }],
        };

        let ocr_json = serde_json::to_string(&verdict.clip_ocr).unwrap_or_else(|e| {
            warn!(resource_id = %clip.resource_id, error = %e, "Failed to encode clip OCR");
            "[]".to_string()
        });

        ClipResource {
            video_index: video.video_index,
            resource_id: clip.resource_id.clone(),
            start_ms: clip.start_ms,
            end_ms: clip.end_ms,
            valid_region,
            frame_size,
            is_begin_clip: tagged && clip.sequence_index == 1,
            is_end_clip: tagged && clip.sequence_index == clip_count,
            ocr_json,
        }
    }

    /// Attach the shared resource list to every montage shot.
    ///
    /// Shots of other types pass through unchanged.
    pub fn attach(&self, shots: &[ScriptShot], resources: &[ClipResource]) -> Vec<ScriptShot> {
        shots
            .iter()
            .map(|shot| {
                if shot.shot_type.needs_montage() {
                    shot.with_resources(resources.to_vec())
                } else {
                    shot.clone()
                }
            })
            .collect()
    }
}
