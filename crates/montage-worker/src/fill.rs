//! Greedy duration fill over an ordered list of source windows.

use montage_models::{BgmResourceEntry, ClipResource, RenderEntry, DURATION_EPSILON};
use serde::{Deserialize, Serialize};

use crate::error::{WorkerError, WorkerResult};

/// A usable stretch of source footage, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillWindow {
    /// 0-based source video position.
    pub video_index: usize,
    pub resource_id: String,
    pub start: f64,
    pub end: f64,
}

impl FillWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl From<&ClipResource> for FillWindow {
    fn from(resource: &ClipResource) -> Self {
        Self {
            video_index: resource.video_index.saturating_sub(1) as usize,
            resource_id: resource.resource_id.clone(),
            start: resource.start_secs(),
            end: resource.end_secs(),
        }
    }
}

/// Render and BGM entries covering a target duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fill {
    pub entries: Vec<RenderEntry>,
    pub bgm_entries: Vec<BgmResourceEntry>,
}

impl Fill {
    pub fn duration(&self) -> f64 {
        self.entries.iter().map(RenderEntry::duration).sum()
    }
}

/// Consume `windows` in order until `target` seconds are covered.
///
/// A window longer than what is left is trimmed to exactly the remainder and
/// ends the scan. Every entry plays at speed 1.0. Running out of windows
/// before the target is covered is a [`WorkerError::DurationShortage`].
pub fn fill_duration(windows: &[FillWindow], target: f64) -> WorkerResult<Fill> {
    let mut fill = Fill::default();
    let mut remaining = target;

    for window in windows {
        if remaining <= DURATION_EPSILON {
            break;
        }
        let duration = window.duration();
        if duration <= DURATION_EPSILON {
            continue;
        }

        let taken = duration.min(remaining);
        fill.entries.push(RenderEntry::new(
            window.video_index,
            window.start,
            window.start + taken,
            1.0,
        ));
        fill.bgm_entries.push(BgmResourceEntry {
            resource_id: window.resource_id.clone(),
            offset: 0.0,
            duration: taken,
        });
        remaining -= taken;
    }

    if remaining > DURATION_EPSILON {
        return Err(WorkerError::DurationShortage {
            requested: target,
            candidates: windows.len(),
            shortfall: remaining,
        });
    }
    Ok(fill)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(video_index: usize, id: &str, start: f64, end: f64) -> FillWindow {
        FillWindow {
            video_index,
            resource_id: id.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_last_window_is_trimmed_to_remainder() {
        let windows = vec![
            window(0, "a", 0.0, 3.0),
            window(1, "b", 1.0, 3.0),
            window(2, "c", 2.0, 7.0),
            window(3, "d", 0.0, 4.0),
        ];
        let fill = fill_duration(&windows, 8.0).unwrap();

        assert_eq!(
            fill.entries,
            vec![
                RenderEntry::new(0, 0.0, 3.0, 1.0),
                RenderEntry::new(1, 1.0, 3.0, 1.0),
                RenderEntry::new(2, 2.0, 5.0, 1.0),
            ]
        );
        assert!((fill.duration() - 8.0).abs() < DURATION_EPSILON);
        let bgm: Vec<f64> = fill.bgm_entries.iter().map(|b| b.duration).collect();
        assert_eq!(bgm, vec![3.0, 2.0, 3.0]);
    }

    #[test]
    fn test_exact_fit_stops_without_trimming() {
        let windows = vec![window(0, "a", 0.0, 3.0), window(0, "b", 3.0, 5.0), window(0, "c", 5.0, 9.0)];
        let fill = fill_duration(&windows, 5.0).unwrap();
        assert_eq!(fill.entries.len(), 2);
    }

    #[test]
    fn test_shortage_reports_shortfall() {
        let windows = vec![window(0, "a", 0.0, 3.0), window(1, "b", 0.0, 2.0)];
        let err = fill_duration(&windows, 8.0).unwrap_err();
        match err {
            WorkerError::DurationShortage {
                requested,
                candidates,
                shortfall,
            } => {
                assert_eq!(requested, 8.0);
                assert_eq!(candidates, 2);
                assert!((shortfall - 3.0).abs() < DURATION_EPSILON);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_length_windows_are_skipped() {
        let windows = vec![window(0, "empty", 2.0, 2.0), window(1, "a", 0.0, 4.0)];
        let fill = fill_duration(&windows, 1.5).unwrap();
        assert_eq!(fill.entries, vec![RenderEntry::new(1, 0.0, 1.5, 1.0)]);
    }

    #[test]
    fn test_zero_target_needs_nothing() {
        let fill = fill_duration(&[], 0.0).unwrap();
        assert!(fill.entries.is_empty());
    }
}
