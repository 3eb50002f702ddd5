//! Narration script models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resource::ClipResource;

/// One captioned narration line placed on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationSegment {
    pub text: String,
    pub target_start_ms: i64,
    pub target_end_ms: i64,
}

impl NarrationSegment {
    pub fn new(text: impl Into<String>, target_start_ms: i64, target_end_ms: i64) -> Self {
        Self {
            text: text.into(),
            target_start_ms,
            target_end_ms,
        }
    }

    pub fn target_duration_ms(&self) -> i64 {
        self.target_end_ms - self.target_start_ms
    }
}

/// Kind of script shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    /// Narration covered by a montage of reused footage clips.
    #[default]
    Montage,
    /// Any shot filled by other means (presenter, template, ...).
    #[serde(other)]
    Other,
}

impl ShotType {
    pub fn needs_montage(&self) -> bool {
        matches!(self, ShotType::Montage)
    }
}

/// One shot of the narration script, holding its captioned lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScriptShot {
    pub index: usize,
    #[serde(default)]
    pub shot_type: ShotType,
    pub narration: Vec<NarrationSegment>,
    /// Length of the synthesized narration audio.
    pub tts_duration_ms: i64,
    /// Candidate clips, attached only to montage shots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_resources: Option<Vec<ClipResource>>,
}

impl ScriptShot {
    pub fn new(index: usize, shot_type: ShotType, narration: Vec<NarrationSegment>, tts_duration_ms: i64) -> Self {
        Self {
            index,
            shot_type,
            narration,
            tts_duration_ms,
            clip_resources: None,
        }
    }

    pub fn tts_duration_secs(&self) -> f64 {
        self.tts_duration_ms as f64 / 1000.0
    }

    /// Copy of this shot carrying `resources`.
    pub fn with_resources(&self, resources: Vec<ClipResource>) -> Self {
        Self {
            clip_resources: Some(resources),
            ..self.clone()
        }
    }
}
