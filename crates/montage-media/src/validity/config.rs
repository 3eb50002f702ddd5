//! Thresholds for on-screen text checks.

use serde::{Deserialize, Serialize};

fn default_center_width_iou() -> f64 {
    1.0
}

fn default_center_height_iou() -> f64 {
    0.1
}

/// Mask-subtitle thresholds used by [`ClipValidityClassifier`](super::ClipValidityClassifier).
///
/// Field aliases accept the keys used by the product configuration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskSubtitleConfig {
    /// `[lower, upper]` band for subtitle top edges; empty disables the check.
    #[serde(default, alias = "caption_upper_bound_range")]
    pub caption_upper_bound_band: Vec<f64>,

    /// Fraction of the clip that subtitles must cover to count as a subtitle region.
    #[serde(alias = "subtitle_time_range_th")]
    pub subtitle_coverage_threshold: f64,

    /// `[width, height]` pixel limits; only the height is checked.
    #[serde(alias = "subtitle_pixel_th")]
    pub text_pixel_threshold: [f64; 2],

    /// Normalized `[[w0, w1], [h0, h1]]` bands marking the frame center.
    #[serde(alias = "subtitle_center_range")]
    pub center_band: [[f64; 2]; 2],

    /// Text types subject to the center check.
    #[serde(default, alias = "subtitle_center_type")]
    pub center_text_types: Vec<String>,

    #[serde(alias = "filter_ocr_area_th_rel")]
    pub ocr_area_threshold: f64,

    #[serde(alias = "filter_subtitle_area_th_rel")]
    pub subtitle_area_threshold: f64,

    #[serde(default = "default_center_width_iou", alias = "center_text_width_iou_th")]
    pub center_width_iou_threshold: f64,

    #[serde(default = "default_center_height_iou", alias = "center_text_height_iou_th")]
    pub center_height_iou_threshold: f64,
}

impl MaskSubtitleConfig {
    pub fn text_height_threshold(&self) -> f64 {
        self.text_pixel_threshold[1]
    }

    /// Lower bound of the caption band, if one is configured.
    pub fn caption_band_lower(&self) -> Option<f64> {
        self.caption_upper_bound_band.first().copied()
    }
}

impl Default for MaskSubtitleConfig {
    fn default() -> Self {
        Self {
            caption_upper_bound_band: Vec::new(),
            subtitle_coverage_threshold: 0.5,
            text_pixel_threshold: [f64::MAX, f64::MAX],
            center_band: [[0.25, 0.75], [0.35, 0.65]],
            center_text_types: Vec::new(),
            ocr_area_threshold: 1.0,
            subtitle_area_threshold: 1.0,
            center_width_iou_threshold: default_center_width_iou(),
            center_height_iou_threshold: default_center_height_iou(),
        }
    }
}
