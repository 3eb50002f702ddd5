//! On-screen text checks that decide whether a shot clip can be reused.

mod classifier;
mod config;
pub mod geometry;

pub use classifier::ClipValidityClassifier;
pub use config::MaskSubtitleConfig;
