//! Shared data models for the montage assembly core.
//!
//! This crate provides Serde-serializable types for:
//! - Source videos and shot clips
//! - OCR/subtitle detections and clip validity verdicts
//! - Clip resources and narration script shots
//! - Render plans (renderer entries, BGM entries, captions)
//! - ASR footage pools for live-footage alignment

pub mod asr;
pub mod clip;
pub mod detection;
pub mod error;
pub mod render;
pub mod resource;
pub mod script;
pub mod video;

// Re-export common types
pub use asr::{AsrPoolEntry, AsrSnippet, TimeClip};
pub use clip::{ClipValidity, InvalidReason, Region, SequenceCounters, ShotClip, ValidSubtitleRegion};
pub use detection::{BBox, Detection};
pub use error::{ModelError, ModelResult};
pub use render::{BgmResourceEntry, CaptionEntry, MatchType, RenderEntry, RenderResult, SourceWindow};
pub use resource::ClipResource;
pub use script::{NarrationSegment, ScriptShot, ShotType};
pub use video::{FrameSize, SourceVideo, VideoId};

/// Tolerance for comparing accumulated durations in seconds.
pub const DURATION_EPSILON: f64 = 1e-6;
