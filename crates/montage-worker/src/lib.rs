//! Montage assembly stages.
//!
//! This crate provides:
//! - Shot segmentation with detection caching and long-shot splitting
//! - Clip validity annotation and clip resource preparation
//! - Text-video matching with a random fill fallback
//! - Audio and ASR driven footage alignment
//! - Main track layout and the end-to-end stage runner

pub mod asr_align;
pub mod audio_align;
pub mod classify;
pub mod config;
pub mod config_store;
pub mod error;
pub mod fill;
pub mod logging;
pub mod matcher;
pub mod metrics;
pub mod pipeline;
pub mod preparer;
pub mod request;
pub mod segmenter;
pub mod timeline;

#[cfg(test)]
mod testing;

pub use asr_align::{build_asr_pool, AlignedLine, AsrAlignment, AsrUtterance, AsrVideoAligner, LineAligner};
pub use audio_align::{target_from_audio, AudioVideoAligner};
pub use classify::{classify_all, AnnotatedVideo, VideoDetections};
pub use config::{LineAlignParams, MatcherConfig, PreparerConfig, SegmenterConfig, WorkerConfig};
pub use config_store::{ConfigStore, FileConfigStore, StaticConfigStore, TextMatchConfig};
pub use error::{WorkerError, WorkerResult};
pub use fill::{fill_duration, Fill, FillWindow};
pub use logging::RequestLogger;
pub use matcher::{MatchContext, RandomMatchStrategy, TemporalMatcher};
pub use pipeline::MontagePipeline;
pub use preparer::ClipResourcePreparer;
pub use request::{MontageRequest, RenderPlan};
pub use segmenter::{ShotSegmenter, ShotWindow, SplitSupport};
pub use timeline::{MainTrack, MainTrackPlanner, TrackClip, TrackItem};
