//! Shot segmentation: source video to corrected, numbered shot clips.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use montage_media::VideoSplitter;
use montage_ml_client::ShotDetector;
use montage_models::{SequenceCounters, ShotClip, SourceVideo};
use montage_storage::{
    load_json, shot_clip_cache_key, split_cache_key, store_json, BlobCache, ClipPublisher,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SegmenterConfig;
use crate::metrics;

/// A shot window with its playable resource, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotWindow {
    pub start_ms: i64,
    pub end_ms: i64,
    pub resource_id: String,
}

/// Normalized detection result as stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedDetection {
    success: bool,
    version: String,
    clips: Vec<ShotWindow>,
}

/// Tools for splitting long shots.
#[derive(Clone)]
pub struct SplitSupport {
    pub splitter: Arc<dyn VideoSplitter>,
    pub publisher: Arc<dyn ClipPublisher>,
}

/// Cuts source videos into reusable shot clips.
pub struct ShotSegmenter {
    detector: Arc<dyn ShotDetector>,
    cache: Arc<dyn BlobCache>,
    split: Option<SplitSupport>,
    config: SegmenterConfig,
}

impl ShotSegmenter {
    pub fn new(
        detector: Arc<dyn ShotDetector>,
        cache: Arc<dyn BlobCache>,
        config: SegmenterConfig,
    ) -> Self {
        Self {
            detector,
            cache,
            split: None,
            config,
        }
    }

    pub fn with_split_support(mut self, split: SplitSupport) -> Self {
        self.split = Some(split);
        self
    }

    /// Segment every video with a fresh set of sequence counters.
    pub async fn segment_all(&self, videos: &[SourceVideo]) -> Vec<Vec<ShotClip>> {
        let mut counters = SequenceCounters::new();
        let mut all = Vec::with_capacity(videos.len());
        for video in videos {
            all.push(self.segment(video, &mut counters).await);
        }
        all
    }

    /// Segment one video.
    ///
    /// Detection failures yield no clips for the video; they are logged and
    /// counted but never surface as errors.
    pub async fn segment(&self, video: &SourceVideo, counters: &mut SequenceCounters) -> Vec<ShotClip> {
        let Some(raw) = self.detected_shots(video).await else {
            return Vec::new();
        };

        let mut windows = Vec::new();
        for shot in raw {
            let start_ms = shot.start_ms + self.config.margin_ms;
            let end_ms = shot.end_ms - self.config.margin_ms;
            let duration = end_ms - start_ms;
            if duration <= 0 || duration < self.config.min_duration_ms {
                continue;
            }

            if self.config.split_enabled && duration > self.config.split_threshold_ms {
                match self.split_shot(video, &shot.resource_id, start_ms, end_ms).await {
                    Some(pieces) => windows.extend(pieces),
                    None => windows.push(ShotWindow {
                        start_ms,
                        end_ms,
                        resource_id: shot.resource_id,
                    }),
                }
            } else {
                windows.push(ShotWindow {
                    start_ms,
                    end_ms,
                    resource_id: shot.resource_id,
                });
            }
        }

        let clips: Vec<ShotClip> = windows
            .into_iter()
            .filter(|w| w.end_ms > w.start_ms)
            .filter_map(|w| {
                let index = counters.next(&video.id);
                ShotClip::new(video.id.clone(), w.start_ms, w.end_ms, w.resource_id, index).ok()
            })
            .collect();

        metrics::record_shot_clips_emitted(clips.len());
        info!(
            video_id = %video.id,
            resource_id = %video.resource_id,
            clips = clips.len(),
            "Segmented video"
        );
        clips
    }

    /// Raw shots from the cache, or from the detector on a miss.
    async fn detected_shots(&self, video: &SourceVideo) -> Option<Vec<ShotWindow>> {
        let key = shot_clip_cache_key(&video.resource_id, &self.config.detector_version);

        if let Some(cached) = load_json::<CachedDetection>(self.cache.as_ref(), &key).await {
            metrics::record_shot_cache_lookup(true);
            debug!(video_id = %video.id, key = %key, version = %cached.version, "Using cached shots");
            return Some(cached.clips);
        }
        metrics::record_shot_cache_lookup(false);

        let response = match self.detector.detect(&video.resource_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    video_id = %video.id,
                    resource_id = %video.resource_id,
                    error = %e,
                    "Shot detection failed, video yields no clips"
                );
                metrics::record_shot_detection_failed("error");
                return None;
            }
        };

        if !response.success {
            warn!(
                video_id = %video.id,
                resource_id = %video.resource_id,
                "Shot detection unsuccessful, video yields no clips"
            );
            metrics::record_shot_detection_failed("unsuccessful");
            return None;
        }

        let clips: Vec<ShotWindow> = response
            .clips
            .into_iter()
            .filter_map(|shot| {
                shot.resource_id.map(|resource_id| ShotWindow {
                    start_ms: shot.start_time,
                    end_ms: shot.end_time,
                    resource_id,
                })
            })
            .collect();

        if clips.is_empty() {
            metrics::record_shot_detection_failed("empty");
            return Some(clips);
        }

        let entry = CachedDetection {
            success: response.success,
            version: if response.version.is_empty() {
                self.config.detector_version.clone()
            } else {
                response.version
            },
            clips,
        };
        if let Err(e) = store_json(self.cache.as_ref(), &key, &entry).await {
            warn!(key = %key, error = %e, "Failed to cache shot detection result");
        }
        Some(entry.clips)
    }

    /// Split pieces of a long shot, from the cache or by splitting the local file.
    ///
    /// `None` means the caller should keep the shot whole.
    async fn split_shot(
        &self,
        video: &SourceVideo,
        parent_resource_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Option<Vec<ShotWindow>> {
        let key = split_cache_key(parent_resource_id);
        if let Some(pieces) = load_json::<Vec<ShotWindow>>(self.cache.as_ref(), &key).await {
            return Some(pieces);
        }

        let Some(split) = &self.split else {
            metrics::record_split_fallback("unsupported");
            return None;
        };
        let Some(local_path) = video.local_path.as_deref() else {
            warn!(video_id = %video.id, "No local file for splitting, keeping shot whole");
            metrics::record_split_fallback("no_local_file");
            return None;
        };

        let pieces = match self.split_and_publish(split, local_path, start_ms, end_ms).await {
            Ok(pieces) => pieces,
            Err(reason) => {
                warn!(
                    video_id = %video.id,
                    parent = %parent_resource_id,
                    reason = %reason,
                    "Shot split failed, keeping shot whole"
                );
                metrics::record_split_fallback("split_failed");
                return None;
            }
        };

        if pieces.is_empty() {
            warn!(
                video_id = %video.id,
                parent = %parent_resource_id,
                min_duration_ms = self.config.min_duration_ms,
                "Every split piece is below the minimum duration, shot yields no clips"
            );
        }
        if let Err(e) = store_json(self.cache.as_ref(), &key, &pieces).await {
            warn!(key = %key, error = %e, "Failed to cache split pieces");
        }
        Some(pieces)
    }

    async fn split_and_publish(
        &self,
        split: &SplitSupport,
        local_path: &Path,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<ShotWindow>, String> {
        let interval_ms = self.config.split_interval_ms();
        let files = split
            .splitter
            .split(
                local_path,
                interval_ms as f64 / 1000.0,
                start_ms as f64 / 1000.0,
                end_ms as f64 / 1000.0,
            )
            .await
            .map_err(|e| e.to_string())?;

        let published = self.publish_pieces(split, &files, start_ms, end_ms).await;
        remove_piece_files(&files).await;
        published
    }

    async fn publish_pieces(
        &self,
        split: &SplitSupport,
        files: &[PathBuf],
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<ShotWindow>, String> {
        let interval_ms = self.config.split_interval_ms();
        let mut pieces = Vec::new();
        let mut piece_start = start_ms;
        for file in files {
            let piece_end = (piece_start + interval_ms).min(end_ms);
            if piece_end - piece_start >= self.config.min_duration_ms && piece_end > piece_start {
                let resource_id = split.publisher.publish(file).await.map_err(|e| e.to_string())?;
                pieces.push(ShotWindow {
                    start_ms: piece_start,
                    end_ms: piece_end,
                    resource_id,
                });
            }
            piece_start = piece_end;
        }
        Ok(pieces)
    }
}

/// Delete local piece files once they are published or abandoned.
async fn remove_piece_files(files: &[PathBuf]) {
    for file in files {
        match tokio::fs::remove_file(file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %file.display(), error = %e, "Failed to remove split piece"),
        }
    }
}
