//! Render plan models produced by matching and alignment.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruction for the renderer: play a window of a source video at a speed.
///
/// Times are seconds in the source video's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderEntry {
    /// 0-based index of the source video.
    pub source_video_index: usize,
    pub clip_start: f64,
    pub clip_end: f64,
    /// Time-stretch factor; playback length is `(clip_end - clip_start) / speed_factor`.
    pub speed_factor: f64,
}

impl RenderEntry {
    pub fn new(source_video_index: usize, clip_start: f64, clip_end: f64, speed_factor: f64) -> Self {
        Self {
            source_video_index,
            clip_start,
            clip_end,
            speed_factor,
        }
    }

    /// Length of the source window.
    pub fn duration(&self) -> f64 {
        self.clip_end - self.clip_start
    }

    /// Length on the output timeline after time-stretch.
    pub fn playback_duration(&self) -> f64 {
        if self.speed_factor > 0.0 {
            self.duration() / self.speed_factor
        } else {
            self.duration()
        }
    }
}

/// Clip-level entry consumed by BGM matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BgmResourceEntry {
    pub resource_id: String,
    pub offset: f64,
    pub duration: f64,
}

/// A caption placed on the output timeline (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionEntry {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// A window of a source resource used by a render line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceWindow {
    pub resource_id: String,
    pub start: f64,
    pub end: f64,
}

/// How a render result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Text-video matching service.
    #[default]
    Model,
    /// Local random duration fill.
    Random,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Model => "model",
            MatchType::Random => "random",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matching outcome for one script shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderResult {
    pub shot_index: usize,
    pub match_type: MatchType,
    /// Flat clip list for BGM matching.
    pub bgm_entries: Vec<BgmResourceEntry>,
    /// Renderer entries grouped per narration line.
    pub render_lines: Vec<Vec<RenderEntry>>,
}

impl RenderResult {
    /// Total output-timeline length of all entries.
    pub fn playback_duration(&self) -> f64 {
        self.render_lines
            .iter()
            .flatten()
            .map(RenderEntry::playback_duration)
            .sum()
    }

    pub fn entry_count(&self) -> usize {
        self.render_lines.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_duration_applies_speed() {
        let entry = RenderEntry::new(0, 1.0, 4.0, 1.5);
        assert!((entry.duration() - 3.0).abs() < 1e-9);
        assert!((entry.playback_duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_result_totals() {
        let result = RenderResult {
            shot_index: 0,
            match_type: MatchType::Random,
            bgm_entries: vec![],
            render_lines: vec![
                vec![RenderEntry::new(0, 0.0, 2.0, 1.0)],
                vec![RenderEntry::new(1, 0.0, 3.0, 1.0), RenderEntry::new(2, 1.0, 2.0, 1.0)],
            ],
        };
        assert_eq!(result.entry_count(), 3);
        assert!((result.playback_duration() - 6.0).abs() < 1e-9);
        assert_eq!(result.match_type.to_string(), "random");
    }
}
