//! Stage telemetry.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Metric names as constants for consistency.
pub mod names {
    // Segmentation
    pub const SHOT_CACHE_LOOKUPS_TOTAL: &str = "montage_shot_cache_lookups_total";
    pub const SHOT_DETECTION_FAILED_TOTAL: &str = "montage_shot_detection_failed_total";
    pub const SHOT_SPLIT_FALLBACK_TOTAL: &str = "montage_shot_split_fallback_total";
    pub const SHOT_CLIPS_EMITTED_TOTAL: &str = "montage_shot_clips_emitted_total";

    // Classification
    pub const INVALID_SHOT_CLIP_TOTAL: &str = "montage_invalid_shot_clip_total";
    pub const SHOT_CLIP_TEXT_TYPE_TOTAL: &str = "montage_shot_clip_text_type_total";
    pub const VALID_SHOT_CLIPS: &str = "montage_valid_shot_clips";

    // Matching and alignment
    pub const TEXT_VIDEO_MATCH_FAILED_TOTAL: &str = "montage_text_video_match_failed_total";
    pub const MATCHED_VIDEO_LIST_EMPTY_TOTAL: &str = "montage_matched_video_list_empty_total";
    pub const RANDOM_MATCH_FALLBACK_TOTAL: &str = "montage_random_match_fallback_total";
    pub const DURATION_SHORTAGE_TOTAL: &str = "montage_duration_shortage_total";
    pub const ASR_LINE_UNMATCHED_TOTAL: &str = "montage_asr_line_unmatched_total";

    pub const STAGE_DURATION_SECONDS: &str = "montage_stage_duration_seconds";
}

/// Install the Prometheus recorder, serving `/metrics` on `port` when given.
pub fn init_metrics(port: Option<u16>) -> Result<(), BuildError> {
    let builder = PrometheusBuilder::new();
    match port {
        Some(port) => builder.with_http_listener(([0, 0, 0, 0], port)).install(),
        None => builder.install_recorder().map(|_| ()),
    }
}

/// Record a detection-cache lookup (`hit` or `miss`).
pub fn record_shot_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!(names::SHOT_CACHE_LOOKUPS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_shot_detection_failed(reason: &str) {
    counter!(names::SHOT_DETECTION_FAILED_TOTAL, "reason" => reason.to_string()).increment(1);
}

pub fn record_split_fallback(reason: &str) {
    counter!(names::SHOT_SPLIT_FALLBACK_TOTAL, "reason" => reason.to_string()).increment(1);
}

pub fn record_shot_clips_emitted(count: usize) {
    counter!(names::SHOT_CLIPS_EMITTED_TOTAL).increment(count as u64);
}

pub fn record_invalid_clip(reason: &str) {
    counter!(names::INVALID_SHOT_CLIP_TOTAL, "reason" => reason.to_string()).increment(1);
}

pub fn record_text_type(text_type: &str) {
    counter!(names::SHOT_CLIP_TEXT_TYPE_TOTAL, "text_type" => text_type.to_string()).increment(1);
}

pub fn set_valid_clip_count(count: usize) {
    gauge!(names::VALID_SHOT_CLIPS).set(count as f64);
}

pub fn record_match_failed(result_code: &str) {
    counter!(names::TEXT_VIDEO_MATCH_FAILED_TOTAL, "result_code" => result_code.to_string())
        .increment(1);
}

pub fn record_matched_list_empty() {
    counter!(names::MATCHED_VIDEO_LIST_EMPTY_TOTAL).increment(1);
}

pub fn record_random_fallback(trigger: &str) {
    counter!(names::RANDOM_MATCH_FALLBACK_TOTAL, "trigger" => trigger.to_string()).increment(1);
}

pub fn record_duration_shortage(stage: &str) {
    counter!(names::DURATION_SHORTAGE_TOTAL, "stage" => stage.to_string()).increment(1);
}

pub fn record_asr_line_unmatched() {
    counter!(names::ASR_LINE_UNMATCHED_TOTAL).increment(1);
}

pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage.to_string()).record(duration_secs);
}
