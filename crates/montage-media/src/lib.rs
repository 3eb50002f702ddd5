//! Media processing for shot clips.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and execution
//! - Splitting long clips into fixed-length pieces
//! - OCR/subtitle based clip validity classification

pub mod command;
pub mod error;
pub mod split;
pub mod validity;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use split::{FfmpegSplitter, VideoSplitter};
pub use validity::{ClipValidityClassifier, MaskSubtitleConfig};
