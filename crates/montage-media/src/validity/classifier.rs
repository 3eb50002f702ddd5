//! Per-clip on-screen text classification.

use montage_models::{
    BBox, ClipValidity, Detection, FrameSize, InvalidReason, Region, ShotClip, ValidSubtitleRegion,
};
use tracing::trace;

use super::config::MaskSubtitleConfig;
use super::geometry::{area_occupancy, band_iou, clip_to_window, row_occupancy, union_length_ms};

const COVERAGE_EPSILON: f64 = 1e-8;

/// Decides whether a shot clip is visually safe to reuse.
///
/// Checks run in a fixed order (big text, center text, overmuch text,
/// overmuch subtitle) and the last failing one is reported.
#[derive(Debug, Clone)]
pub struct ClipValidityClassifier {
    config: MaskSubtitleConfig,
}

impl ClipValidityClassifier {
    pub fn new(config: MaskSubtitleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaskSubtitleConfig {
        &self.config
    }

    /// Classify `clip` against the detections of its source video.
    ///
    /// A clip with no OCR or no subtitle data is left valid with no region.
    pub fn classify(
        &self,
        clip: &ShotClip,
        ocr: Option<&[Detection]>,
        subtitles: Option<&[Detection]>,
        frame: FrameSize,
    ) -> ClipValidity {
        let (Some(ocr), Some(subtitles)) = (ocr, subtitles) else {
            return ClipValidity::unannotated(clip.clone());
        };

        let clip_ocr = clip_to_window(ocr, clip.start_ms, clip.end_ms);
        let clip_subtitles = clip_to_window(subtitles, clip.start_ms, clip.end_ms);

        let mut invalid_reason = InvalidReason::None;
        if self.has_big_text(&clip_subtitles) {
            invalid_reason = InvalidReason::BigText;
        }
        if self.has_center_text(&clip_subtitles, frame) {
            invalid_reason = InvalidReason::CenterText;
        }
        if self.has_overmuch_text(&clip_ocr, frame) {
            invalid_reason = InvalidReason::OvermuchText;
        }
        if self.has_overmuch_subtitle(&clip_subtitles, frame) {
            invalid_reason = InvalidReason::OvermuchSubtitle;
        }

        let region = self.subtitle_region(clip, &clip_subtitles, frame);

        trace!(
            video_id = %clip.video_id,
            sequence_index = clip.sequence_index,
            reason = %invalid_reason,
            is_subtitle = region.is_subtitle,
            "Classified clip"
        );

        ClipValidity {
            clip: clip.clone(),
            valid: invalid_reason == InvalidReason::None,
            invalid_reason,
            valid_subtitle_region: Some(region),
            clip_ocr,
            clip_subtitles,
        }
    }

    fn has_big_text(&self, subtitles: &[Detection]) -> bool {
        let threshold = self.config.text_height_threshold();
        subtitles.iter().any(|s| s.bbox_height() >= threshold)
    }

    fn has_center_text(&self, subtitles: &[Detection], frame: FrameSize) -> bool {
        if frame.width == 0 || frame.height == 0 {
            return false;
        }
        let (width, height) = (frame.width as f64, frame.height as f64);
        let [width_band, height_band] = self.config.center_band;

        subtitles
            .iter()
            .filter(|s| self.config.center_text_types.iter().any(|t| *t == s.text_type))
            .any(|s| {
                let width_iou = band_iou(s.bbox[0] / width, s.bbox[2] / width, width_band);
                let height_iou = band_iou(s.bbox[1] / height, s.bbox[3] / height, height_band);
                width_iou > self.config.center_width_iou_threshold
                    || height_iou >= self.config.center_height_iou_threshold
            })
    }

    fn has_overmuch_text(&self, ocr: &[Detection], frame: FrameSize) -> bool {
        let boxes: Vec<BBox> = ocr.iter().map(|d| d.bbox).collect();
        area_occupancy(&boxes, frame) >= self.config.ocr_area_threshold
    }

    fn has_overmuch_subtitle(&self, subtitles: &[Detection], frame: FrameSize) -> bool {
        let boxes: Vec<BBox> = subtitles.iter().map(|d| d.bbox).collect();
        row_occupancy(&boxes, frame.height) >= self.config.subtitle_area_threshold
    }

    fn subtitle_region(
        &self,
        clip: &ShotClip,
        subtitles: &[Detection],
        frame: FrameSize,
    ) -> ValidSubtitleRegion {
        let coverage =
            union_length_ms(subtitles) as f64 / (clip.duration_ms() as f64 + COVERAGE_EPSILON);
        let top_edge = subtitles.iter().map(|s| s.bbox[1]).fold(f64::MIN, f64::max);
        let below_band = self
            .config
            .caption_band_lower()
            .map_or(true, |lower| top_edge <= lower);

        if !subtitles.is_empty() && coverage > self.config.subtitle_coverage_threshold && below_band {
            ValidSubtitleRegion {
                is_subtitle: true,
                regions: subtitles.iter().map(Region::from).collect(),
            }
        } else {
            ValidSubtitleRegion {
                is_subtitle: false,
                regions: vec![Region {
                    start_ms: clip.start_ms,
                    end_ms: clip.end_ms,
                    bbox: frame.full_frame_bbox(),
                }],
            }
        }
    }
}
