//! Validity annotation of every shot clip of a request.

use std::collections::HashMap;

use montage_media::validity::geometry::clip_to_window;
use montage_media::ClipValidityClassifier;
use montage_models::{ClipValidity, Detection, ShotClip, SourceVideo, VideoId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics;

/// OCR and subtitle detections of one source video.
///
/// A missing list means the detection never ran for the video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDetections {
    #[serde(default)]
    pub ocr: Option<Vec<Detection>>,
    #[serde(default)]
    pub subtitles: Option<Vec<Detection>>,
}

/// A source video with the verdicts for its clips, in clip order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedVideo {
    pub video: SourceVideo,
    pub clips: Vec<ClipValidity>,
}

/// Classify the clips of every video.
///
/// `clips[i]` holds the clips cut from `videos[i]`.
pub fn classify_all(
    classifier: &ClipValidityClassifier,
    videos: &[SourceVideo],
    clips: &[Vec<ShotClip>],
    detections: &HashMap<VideoId, VideoDetections>,
) -> Vec<AnnotatedVideo> {
    let mut valid_count = 0;
    let annotated: Vec<AnnotatedVideo> = videos
        .iter()
        .zip(clips)
        .map(|(video, video_clips)| {
            let found = detections.get(&video.id);
            let ocr = found.and_then(|d| d.ocr.as_deref());
            let subtitles = found.and_then(|d| d.subtitles.as_deref());

            let verdicts: Vec<ClipValidity> = video_clips
                .iter()
                .map(|clip| {
                    if let Some(subtitles) = subtitles {
                        for det in clip_to_window(subtitles, clip.start_ms, clip.end_ms) {
                            metrics::record_text_type(&det.text_type);
                        }
                    }
                    let verdict = classifier.classify(clip, ocr, subtitles, video.frame_size());
                    if verdict.valid {
                        valid_count += 1;
                    } else {
                        metrics::record_invalid_clip(verdict.invalid_reason.as_str());
                    }
                    verdict
                })
                .collect();

            debug!(
                video_id = %video.id,
                clips = verdicts.len(),
                invalid = verdicts.iter().filter(|v| !v.valid).count(),
                "Classified clips"
            );
            AnnotatedVideo {
                video: video.clone(),
                clips: verdicts,
            }
        })
        .collect();

    metrics::set_valid_clip_count(valid_count);
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_media::MaskSubtitleConfig;
    use montage_models::InvalidReason;

    fn video() -> SourceVideo {
        SourceVideo::new("v1", 1, "videos/v1.mp4", 10000, 720, 1280)
    }

    fn clips() -> Vec<ShotClip> {
        vec![
            ShotClip::new("v1", 0, 3000, "r1", 1).unwrap(),
            ShotClip::new("v1", 3000, 6000, "r2", 2).unwrap(),
        ]
    }

    #[test]
    fn test_videos_without_detections_stay_valid() {
        let classifier = ClipValidityClassifier::new(MaskSubtitleConfig::default());
        let annotated = classify_all(&classifier, &[video()], &[clips()], &HashMap::new());

        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].clips.len(), 2);
        assert!(annotated[0]
            .clips
            .iter()
            .all(|v| v.valid && v.valid_subtitle_region.is_none()));
    }

    #[test]
    fn test_big_text_marks_only_overlapping_clip() {
        let classifier = ClipValidityClassifier::new(MaskSubtitleConfig {
            text_pixel_threshold: [700.0, 120.0],
            ..MaskSubtitleConfig::default()
        });
        let tall = Detection::new(500, 2500, [100.0, 100.0, 600.0, 500.0], "subtitle");
        let detections = HashMap::from([(
            VideoId::from("v1"),
            VideoDetections {
                ocr: Some(vec![]),
                subtitles: Some(vec![tall]),
            },
        )]);

        let annotated = classify_all(&classifier, &[video()], &[clips()], &detections);
        let verdicts = &annotated[0].clips;
        assert!(!verdicts[0].valid);
        assert_eq!(verdicts[0].invalid_reason, InvalidReason::BigText);
        assert!(verdicts[1].valid);
        assert_eq!(verdicts[1].invalid_reason, InvalidReason::None);
    }

    #[test]
    fn test_text_types_are_counted_per_clip_window() {
        let classifier = ClipValidityClassifier::new(MaskSubtitleConfig::default());
        let band = [100.0, 1000.0, 600.0, 1060.0];
        let detections = HashMap::from([(
            VideoId::from("v1"),
            VideoDetections {
                ocr: Some(vec![Detection::new(0, 6000, band, "logo")]),
                subtitles: Some(vec![
                    Detection::new(500, 2500, band, "subtitle"),
                    // Spans the cut, so both clips see it.
                    Detection::new(2000, 5000, band, "subtitle"),
                    Detection::new(4000, 5500, band, "title"),
                    // 50ms inside the second clip is below the overlap minimum.
                    Detection::new(5950, 7000, band, "caption"),
                ]),
            },
        )]);

        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || {
            classify_all(&classifier, &[video()], &[clips()], &detections);
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"montage_shot_clip_text_type_total{text_type="subtitle"} 3"#));
        assert!(rendered.contains(r#"montage_shot_clip_text_type_total{text_type="title"} 1"#));
        assert!(!rendered.contains(r#"text_type="caption""#));
        assert!(!rendered.contains(r#"text_type="logo""#));
    }
}
