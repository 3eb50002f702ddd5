//! Stage configuration.

use serde::{Deserialize, Serialize};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Shot segmentation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Trimmed from both ends of every detected shot to avoid boundary bleed.
    pub margin_ms: i64,
    /// Corrected shots shorter than this are dropped.
    pub min_duration_ms: i64,
    pub split_enabled: bool,
    /// Corrected shots longer than this are split into halves of it.
    pub split_threshold_ms: i64,
    /// Part of the detection cache key.
    pub detector_version: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            margin_ms: 200,
            min_duration_ms: 1000,
            split_enabled: false,
            split_threshold_ms: 20000,
            detector_version: "transnetv2".to_string(),
        }
    }
}

impl SegmenterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            margin_ms: env_or("SHOT_MARGIN_MS", defaults.margin_ms),
            min_duration_ms: env_or("SHOT_MIN_DURATION_MS", defaults.min_duration_ms),
            split_enabled: env_or("SHOT_SPLIT_ENABLED", defaults.split_enabled),
            split_threshold_ms: env_or("SHOT_SPLIT_THRESHOLD_MS", defaults.split_threshold_ms),
            detector_version: std::env::var("SHOT_DETECTOR_VERSION")
                .unwrap_or(defaults.detector_version),
        }
    }

    /// Length of the pieces a long shot is split into.
    pub fn split_interval_ms(&self) -> i64 {
        self.split_threshold_ms / 2
    }
}

/// Clip resource preparation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreparerConfig {
    /// Videos with at most this many clips get no begin/end tags.
    pub begin_end_clip_min_count: u32,
    /// Offer clips that failed validity checks to matching as well.
    pub keep_invalid_clips: bool,
}

impl Default for PreparerConfig {
    fn default() -> Self {
        Self {
            begin_end_clip_min_count: 3,
            keep_invalid_clips: false,
        }
    }
}

impl PreparerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            begin_end_clip_min_count: env_or(
                "BEGIN_END_CLIP_MIN_COUNT",
                defaults.begin_end_clip_min_count,
            ),
            keep_invalid_clips: env_or("KEEP_INVALID_CLIPS", defaults.keep_invalid_clips),
        }
    }
}

/// Text-video matching parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatcherConfig {
    /// Fill with randomly ordered clips when matching fails.
    pub random_fallback: bool,
    /// Seed for the random fill; fresh entropy when unset.
    pub random_seed: Option<u64>,
}

impl MatcherConfig {
    pub fn from_env() -> Self {
        Self {
            random_fallback: env_or("RANDOM_MATCH_FALLBACK", false),
            random_seed: std::env::var("RANDOM_MATCH_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

/// ASR line alignment parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineAlignParams {
    /// Matched stretches shorter than this (seconds) are discarded.
    pub filter_duration_secs: f64,
    /// Gaps shorter than this (seconds) between utterances are merged.
    pub merge_gap_secs: f64,
}

impl Default for LineAlignParams {
    fn default() -> Self {
        Self {
            filter_duration_secs: 1.5,
            merge_gap_secs: 0.5,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub segmenter: SegmenterConfig,
    pub preparer: PreparerConfig,
    pub matcher: MatcherConfig,
    /// Work directory for split pieces
    pub work_dir: String,
    /// JSON file backing the product configuration store
    pub product_config_path: Option<String>,
    /// Key prefix for published split pieces
    pub piece_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            preparer: PreparerConfig::default(),
            matcher: MatcherConfig::default(),
            work_dir: "/tmp/montage".to_string(),
            product_config_path: None,
            piece_prefix: "shot_pieces".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            segmenter: SegmenterConfig::from_env(),
            preparer: PreparerConfig::from_env(),
            matcher: MatcherConfig::from_env(),
            work_dir: std::env::var("WORKER_WORK_DIR").unwrap_or(defaults.work_dir),
            product_config_path: std::env::var("PRODUCT_CONFIG_PATH").ok(),
            piece_prefix: std::env::var("SHOT_PIECE_PREFIX").unwrap_or(defaults.piece_prefix),
        }
    }
}
