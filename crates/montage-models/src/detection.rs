//! Visual element detections (OCR text and subtitles).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixels: `[x1, y1, x2, y2]`.
pub type BBox = [f64; 4];

/// A text element detected on screen over a time range.
///
/// Subtitle detections are a semantically filtered subset of OCR detections
/// produced upstream; both share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    pub start_ms: i64,
    pub end_ms: i64,
    pub bbox: BBox,
    #[serde(rename = "textType", alias = "text_type", default)]
    pub text_type: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Detection {
    pub fn new(start_ms: i64, end_ms: i64, bbox: BBox, text_type: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            bbox,
            text_type: text_type.into(),
            score: 1.0,
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn bbox_width(&self) -> f64 {
        self.bbox[2] - self.bbox[0]
    }

    pub fn bbox_height(&self) -> f64 {
        self.bbox[3] - self.bbox[1]
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_wire_names() {
        let json = r#"{"start_ms":100,"end_ms":900,"bbox":[0,10,50,40],"textType":"caption","score":0.9}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.text_type, "caption");
        assert_eq!(det.bbox_height(), 30.0);
        assert_eq!(det.duration_ms(), 800);

        let out = serde_json::to_string(&det).unwrap();
        assert!(out.contains("\"textType\":\"caption\""));
        assert!(!out.contains("\"text\""));
    }
}
