//! Main track layout for the renderer.

use std::collections::{BTreeMap, BTreeSet};

use montage_models::{FrameSize, ModelError, RenderEntry, SourceVideo};
use serde::{Deserialize, Serialize};

use crate::error::WorkerResult;

/// One asset on the main track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackItem {
    pub source_video_index: usize,
    pub resource_id: String,
    pub source_start: f64,
    pub source_end: f64,
    pub speed: f64,
    /// Output timeline placement after time-stretch.
    pub display_start: f64,
    pub display_end: f64,
    /// Asset size fitted to the output resolution.
    pub size: FrameSize,
}

/// Footage reference reported to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackClip {
    pub resource_id: String,
    pub start: f64,
    pub end: f64,
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainTrack {
    pub items: Vec<TrackItem>,
    /// Source resources used, grouped by origin.
    pub usage: BTreeMap<String, BTreeSet<String>>,
    pub clips: Vec<TrackClip>,
    pub duration: f64,
}

/// Lays render entries back to back on the output main track.
#[derive(Debug, Clone, Copy)]
pub struct MainTrackPlanner {
    resolution: FrameSize,
}

impl MainTrackPlanner {
    pub fn new(resolution: FrameSize) -> Self {
        Self { resolution }
    }

    pub fn plan(&self, render_lines: &[Vec<RenderEntry>], videos: &[SourceVideo]) -> WorkerResult<MainTrack> {
        let mut track = MainTrack::default();

        for entry in render_lines.iter().flatten() {
            let video = videos
                .get(entry.source_video_index)
                .ok_or(ModelError::UnknownVideoIndex(entry.source_video_index))?;

            let display_start = track.duration;
            let display_end = display_start + entry.playback_duration();

            track
                .usage
                .entry(video.origin.clone())
                .or_default()
                .insert(video.resource_id.clone());
            track.clips.push(TrackClip {
                resource_id: video.resource_id.clone(),
                start: entry.clip_start,
                end: entry.clip_end,
                origin: video.origin.clone(),
            });
            track.items.push(TrackItem {
                source_video_index: entry.source_video_index,
                resource_id: video.resource_id.clone(),
                source_start: entry.clip_start,
                source_end: entry.clip_end,
                speed: entry.speed_factor,
                display_start,
                display_end,
                size: self.fit(video.frame_size()),
            });
            track.duration = display_end;
        }

        Ok(track)
    }

    /// Scale `source` to the output width on portrait output, else to its height.
    fn fit(&self, source: FrameSize) -> FrameSize {
        if source.width == 0 || source.height == 0 {
            return self.resolution;
        }
        let (w, h) = (source.width as f64, source.height as f64);
        if self.resolution.width < self.resolution.height {
            let width = self.resolution.width;
            FrameSize::new(width, (h * width as f64 / w).round() as u32)
        } else {
            let height = self.resolution.height;
            FrameSize::new((w * height as f64 / h).round() as u32, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;

    fn videos() -> Vec<SourceVideo> {
        vec![
            SourceVideo::new("v1", 1, "src/a.mp4", 10000, 1080, 1920),
            SourceVideo::new("v2", 2, "src/b.mp4", 10000, 1920, 1080).with_origin("public"),
            SourceVideo::new("v3", 3, "src/c.mp4", 10000, 720, 1280),
        ]
    }

    #[test]
    fn test_items_are_laid_back_to_back_after_speed() {
        let lines = vec![
            vec![RenderEntry::new(0, 0.0, 3.0, 2.0)],
            vec![RenderEntry::new(1, 1.0, 2.0, 1.0), RenderEntry::new(0, 4.0, 6.0, 0.5)],
        ];
        let track = MainTrackPlanner::new(FrameSize::new(720, 1280)).plan(&lines, &videos()).unwrap();

        let placement: Vec<(f64, f64)> = track.items.iter().map(|i| (i.display_start, i.display_end)).collect();
        assert_eq!(placement, vec![(0.0, 1.5), (1.5, 2.5), (2.5, 6.5)]);
        assert_eq!(track.duration, 6.5);

        assert_eq!(track.usage["private"], BTreeSet::from(["src/a.mp4".to_string()]));
        assert_eq!(track.usage["public"], BTreeSet::from(["src/b.mp4".to_string()]));
        assert_eq!(track.clips.len(), 3);
        assert_eq!(track.clips[1].origin, "public");
    }

    #[test]
    fn test_fit_follows_output_orientation() {
        let lines = vec![vec![RenderEntry::new(0, 0.0, 1.0, 1.0), RenderEntry::new(1, 0.0, 1.0, 1.0)]];

        let portrait = MainTrackPlanner::new(FrameSize::new(720, 1280)).plan(&lines, &videos()).unwrap();
        assert_eq!(portrait.items[0].size, FrameSize::new(720, 1280));
        assert_eq!(portrait.items[1].size, FrameSize::new(720, 405));

        let landscape = MainTrackPlanner::new(FrameSize::new(1280, 720)).plan(&lines, &videos()).unwrap();
        assert_eq!(landscape.items[0].size, FrameSize::new(405, 720));
        assert_eq!(landscape.items[1].size, FrameSize::new(1280, 720));
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        let lines = vec![vec![RenderEntry::new(5, 0.0, 1.0, 1.0)]];
        let err = MainTrackPlanner::new(FrameSize::new(720, 1280)).plan(&lines, &videos()).unwrap_err();
        assert!(matches!(err, WorkerError::Model(ModelError::UnknownVideoIndex(5))));
    }
}
