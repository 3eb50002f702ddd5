//! Service request/response types.

use montage_models::ClipResource;
use serde::{Deserialize, Serialize};

/// Request for shot boundary detection on one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotDetectionRequest {
    pub resource_id: String,
}

/// One raw shot reported by the detector, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedShot {
    pub start_time: i64,
    pub end_time: i64,
    /// Playable sub-resource; shots without one are unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

/// Response from shot boundary detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShotDetectionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub clips: Vec<DetectedShot>,
}

/// One narration line sent for matching; times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

/// Text-to-video matching request for one script shot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub request_id: String,
    pub script: Vec<ScriptLine>,
    pub clip_resources: Vec<ClipResource>,
    pub need_asd: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_industry_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_industry_name: Option<String>,
    /// Request tag of the calling product line.
    pub source_type: String,
}

/// A clip chosen for a line; times in seconds of the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedClip {
    pub resource_id: String,
    /// 1-based source video index.
    pub video_idx: u32,
    pub video_start_time: f64,
    pub video_end_time: f64,
}

impl MatchedClip {
    pub fn duration(&self) -> f64 {
        self.video_end_time - self.video_start_time
    }
}

/// Clips chosen for one narration line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineMatch {
    pub tts_start_time: f64,
    pub tts_end_time: f64,
    /// Total source duration of `video_clips`.
    pub video_clips_duration: f64,
    #[serde(default)]
    pub video_clips: Vec<MatchedClip>,
}

impl LineMatch {
    pub fn tts_duration(&self) -> f64 {
        self.tts_end_time - self.tts_start_time
    }
}

/// Response from the matching service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(rename = "isSuccess", default)]
    pub is_success: bool,
    #[serde(default)]
    pub clips_info: Vec<LineMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<String>,
    /// Service-specific code; sent as a number or a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<serde_json::Value>,
}

impl MatchResponse {
    /// Result code as a label, `"unknown"` when absent.
    pub fn result_code_label(&self) -> String {
        match &self.result_code {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown".to_string(),
        }
    }

    /// Number of matched clips over all lines.
    pub fn clip_count(&self) -> usize {
        self.clips_info.iter().map(|l| l.video_clips.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_response_parsing() {
        let json = r#"{
            "isSuccess": true,
            "clips_info": [{
                "tts_start_time": 0.0,
                "tts_end_time": 2.0,
                "video_clips_duration": 3.0,
                "video_clips": [
                    {"resource_id": "r1", "video_idx": 2, "video_start_time": 1.0, "video_end_time": 4.0}
                ]
            }],
            "result_code": 0
        }"#;
        let response: MatchResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_success);
        assert_eq!(response.clip_count(), 1);
        assert_eq!(response.result_code_label(), "0");
        assert!((response.clips_info[0].tts_duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_detection_response_defaults() {
        let response: ShotDetectionResponse =
            serde_json::from_str(r#"{"clips": [{"start_time": 0, "end_time": 4000}]}"#).unwrap();
        assert!(!response.success);
        assert!(response.clips[0].resource_id.is_none());
    }
}
