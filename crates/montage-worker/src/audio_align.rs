//! One-to-one fill of narration audio with ordered footage.

use montage_models::RenderEntry;
use tracing::{info, warn};

use crate::error::WorkerResult;
use crate::fill::{fill_duration, FillWindow};
use crate::metrics;

/// Sum per-shot audio durations (seconds) into the fill target.
pub fn target_from_audio(durations: &[f64]) -> f64 {
    durations.iter().filter(|d| **d > 0.0).sum()
}

/// Covers an audio track with material that is already in playback order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioVideoAligner;

impl AudioVideoAligner {
    pub fn new() -> Self {
        Self
    }

    pub fn align(&self, windows: &[FillWindow], target_secs: f64) -> WorkerResult<Vec<RenderEntry>> {
        match fill_duration(windows, target_secs) {
            Ok(fill) => {
                info!(
                    target_secs,
                    entries = fill.entries.len(),
                    "Aligned footage to audio"
                );
                Ok(fill.entries)
            }
            Err(e) => {
                if e.is_shortage() {
                    metrics::record_duration_shortage("audio_align");
                }
                warn!(target_secs, candidates = windows.len(), error = %e, "Audio alignment failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use montage_models::DURATION_EPSILON;

    fn window(video_index: usize, start: f64, end: f64) -> FillWindow {
        FillWindow {
            video_index,
            resource_id: format!("m{}", video_index),
            start,
            end,
        }
    }

    #[test]
    fn test_target_from_audio() {
        assert_eq!(target_from_audio(&[2.5, 3.0, 2.5]), 8.0);
        assert_eq!(target_from_audio(&[]), 0.0);
    }

    #[test]
    fn test_ordered_fill_keeps_material_order() {
        let windows = vec![window(0, 0.0, 3.0), window(1, 0.0, 2.0), window(2, 0.0, 5.0)];
        let target = target_from_audio(&[2.5, 3.0, 2.5]);
        let entries = AudioVideoAligner::new().align(&windows, target).unwrap();

        assert_eq!(
            entries,
            vec![
                RenderEntry::new(0, 0.0, 3.0, 1.0),
                RenderEntry::new(1, 0.0, 2.0, 1.0),
                RenderEntry::new(2, 0.0, 3.0, 1.0),
            ]
        );
        let total: f64 = entries.iter().map(RenderEntry::playback_duration).sum();
        assert!((total - target).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_shortage() {
        let windows = vec![window(0, 0.0, 3.0), window(1, 0.0, 2.0)];
        let err = AudioVideoAligner::new().align(&windows, 8.0).unwrap_err();
        assert!(matches!(
            err,
            WorkerError::DurationShortage { shortfall, .. } if (shortfall - 3.0).abs() < DURATION_EPSILON
        ));
    }
}
