//! Alignment of live footage to pre-written subtitle lines through its ASR.

use std::sync::Arc;

use montage_models::{
    AsrPoolEntry, CaptionEntry, ModelError, RenderEntry, SourceVideo, SourceWindow, TimeClip,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LineAlignParams;
use crate::error::WorkerResult;
use crate::metrics;

/// One recognized utterance of a source video, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrUtterance {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Flatten per-video ASR into one pool, tagging each utterance with the
/// 0-based position of its video. Videos without ASR contribute nothing.
pub fn build_asr_pool(per_video: &[Option<Vec<AsrUtterance>>]) -> Vec<AsrPoolEntry> {
    per_video
        .iter()
        .enumerate()
        .filter_map(|(index, utterances)| utterances.as_ref().map(|u| (index, u)))
        .flat_map(|(index, utterances)| {
            utterances.iter().map(move |u| AsrPoolEntry {
                text: u.text.clone(),
                start: u.start,
                end: u.end,
                video_index: index,
            })
        })
        .collect()
}

/// Finds the stretches of the ASR pool that speak a subtitle line.
pub trait LineAligner: Send + Sync {
    fn align_line(
        &self,
        pool: &[AsrPoolEntry],
        line: &str,
        params: &LineAlignParams,
    ) -> WorkerResult<Vec<TimeClip>>;
}

/// Footage chosen for one subtitle line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedLine {
    pub text: String,
    pub entries: Vec<RenderEntry>,
    pub windows: Vec<SourceWindow>,
    pub captions: Vec<CaptionEntry>,
    /// Footage consumed by this line, seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsrAlignment {
    pub lines: Vec<AlignedLine>,
    pub total_duration: f64,
}

pub struct AsrVideoAligner {
    aligner: Arc<dyn LineAligner>,
    params: LineAlignParams,
}

impl AsrVideoAligner {
    pub fn new(aligner: Arc<dyn LineAligner>, params: LineAlignParams) -> Self {
        Self { aligner, params }
    }

    /// Align every line in order.
    ///
    /// Captions are placed on a running output timeline shared by all lines.
    /// A line the aligner cannot place yields an empty [`AlignedLine`].
    pub fn align(
        &self,
        pool: &[AsrPoolEntry],
        videos: &[SourceVideo],
        lines: &[String],
    ) -> WorkerResult<AsrAlignment> {
        let mut alignment = AsrAlignment::default();

        for line in lines {
            let clips = match self.aligner.align_line(pool, line, &self.params) {
                Ok(clips) => clips,
                Err(e) => {
                    warn!(line = %line, error = %e, "ASR line alignment failed");
                    Vec::new()
                }
            };
            if clips.is_empty() {
                warn!(line = %line, "No footage found for subtitle line");
                metrics::record_asr_line_unmatched();
            }

            let mut aligned = AlignedLine {
                text: line.clone(),
                ..AlignedLine::default()
            };
            for clip in &clips {
                let offset = alignment.total_duration + aligned.duration;
                let mut consumed = 0.0;
                for (index, start, end) in footage_windows(clip, videos)? {
                    let video = &videos[index];
                    aligned.entries.push(RenderEntry::new(index, start, end, 1.0));
                    aligned.windows.push(SourceWindow {
                        resource_id: video.resource_id.clone(),
                        start,
                        end,
                    });
                    consumed += end - start;
                }

                let mut spoken = 0.0;
                for snippet in &clip.snippets {
                    aligned.captions.push(CaptionEntry {
                        text: snippet.text.clone(),
                        start: offset + spoken,
                        end: offset + spoken + snippet.duration(),
                    });
                    spoken += snippet.duration();
                }
                aligned.duration += consumed;
            }

            debug!(
                line = %line,
                clips = clips.len(),
                entries = aligned.entries.len(),
                duration = aligned.duration,
                "Aligned subtitle line"
            );
            alignment.total_duration += aligned.duration;
            alignment.lines.push(aligned);
        }

        Ok(alignment)
    }
}

/// Per-video windows `(index, start, end)` covered by a time clip.
fn footage_windows(clip: &TimeClip, videos: &[SourceVideo]) -> WorkerResult<Vec<(usize, f64, f64)>> {
    let last = clip.video_end_idx;
    let highest = last.max(clip.video_start_idx);
    if highest >= videos.len() {
        return Err(ModelError::UnknownVideoIndex(highest).into());
    }
    if !clip.spans_videos() {
        return Ok(vec![(clip.video_start_idx, clip.start, clip.end)]);
    }

    Ok((clip.video_start_idx..=last)
        .map(|index| {
            let duration = videos[index].duration_secs();
            if index == clip.video_start_idx {
                (index, clip.start, duration)
            } else if index == last {
                (index, 0.0, clip.end)
            } else {
                (index, 0.0, duration)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use montage_models::{AsrSnippet, DURATION_EPSILON};
    use std::collections::HashMap;

    struct ScriptedAligner {
        clips: HashMap<String, Vec<TimeClip>>,
    }

    impl LineAligner for ScriptedAligner {
        fn align_line(
            &self,
            _pool: &[AsrPoolEntry],
            line: &str,
            _params: &LineAlignParams,
        ) -> WorkerResult<Vec<TimeClip>> {
            self.clips
                .get(line)
                .cloned()
                .ok_or_else(|| WorkerError::empty_result("line_align"))
        }
    }

    fn videos() -> Vec<SourceVideo> {
        (1..=5)
            .map(|i| SourceVideo::new(format!("v{}", i), i, format!("live/{}.mp4", i), 10000, 720, 1280))
            .collect()
    }

    fn snippet(video_index: usize, start: f64, end: f64, text: &str) -> AsrSnippet {
        AsrSnippet {
            video_index,
            start,
            end,
            text: text.to_string(),
        }
    }

    fn clip(video_start: usize, start: f64, video_end: usize, end: f64, snippets: Vec<AsrSnippet>) -> TimeClip {
        TimeClip {
            asr_start_idx: 0,
            asr_end_idx: 0,
            video_start_idx: video_start,
            video_end_idx: video_end,
            start,
            end,
            snippets,
        }
    }

    fn aligner(clips: Vec<(&str, Vec<TimeClip>)>) -> AsrVideoAligner {
        let clips = clips.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        AsrVideoAligner::new(Arc::new(ScriptedAligner { clips }), LineAlignParams::default())
    }

    #[test]
    fn test_build_asr_pool_skips_missing_videos() {
        let utterance = |text: &str, start: f64, end: f64| AsrUtterance {
            text: text.to_string(),
            start,
            end,
        };
        let pool = build_asr_pool(&[
            Some(vec![utterance("a", 0.0, 1.0), utterance("b", 1.0, 2.0)]),
            None,
            Some(vec![utterance("c", 0.5, 1.5)]),
        ]);

        let tagged: Vec<(&str, usize)> = pool.iter().map(|e| (e.text.as_str(), e.video_index)).collect();
        assert_eq!(tagged, vec![("a", 0), ("b", 0), ("c", 2)]);
    }

    #[test]
    fn test_clip_spanning_three_videos() {
        let aligner = aligner(vec![("line", vec![clip(2, 7.5, 4, 3.0, vec![])])]);
        let result = aligner.align(&[], &videos(), &["line".to_string()]).unwrap();

        let entries = &result.lines[0].entries;
        assert_eq!(
            entries,
            &vec![
                RenderEntry::new(2, 7.5, 10.0, 1.0),
                RenderEntry::new(3, 0.0, 10.0, 1.0),
                RenderEntry::new(4, 0.0, 3.0, 1.0),
            ]
        );
        assert_eq!(result.lines[0].windows[1].resource_id, "live/4.mp4");
        assert!((result.total_duration - 15.5).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_captions_follow_running_offset() {
        let aligner = aligner(vec![
            (
                "one",
                vec![clip(0, 1.0, 0, 4.0, vec![snippet(0, 1.0, 2.5, "hello"), snippet(0, 2.5, 4.0, "there")])],
            ),
            ("two", vec![clip(1, 2.0, 1, 4.0, vec![snippet(1, 2.0, 4.0, "again")])]),
        ]);
        let result = aligner
            .align(&[], &videos(), &["one".to_string(), "two".to_string()])
            .unwrap();

        let captions: Vec<(&str, f64, f64)> = result
            .lines
            .iter()
            .flat_map(|l| &l.captions)
            .map(|c| (c.text.as_str(), c.start, c.end))
            .collect();
        assert_eq!(
            captions,
            vec![("hello", 0.0, 1.5), ("there", 1.5, 3.0), ("again", 3.0, 5.0)]
        );
        assert_eq!(result.lines[0].duration, 3.0);
        assert_eq!(result.total_duration, 5.0);
    }

    #[test]
    fn test_unmatched_line_is_soft_failure() {
        let aligner = aligner(vec![("known", vec![clip(0, 0.0, 0, 2.0, vec![])])]);
        let result = aligner
            .align(&[], &videos(), &["missing".to_string(), "known".to_string()])
            .unwrap();

        assert_eq!(result.lines.len(), 2);
        assert!(result.lines[0].entries.is_empty());
        assert_eq!(result.lines[0].text, "missing");
        assert_eq!(result.lines[1].entries.len(), 1);
        assert_eq!(result.total_duration, 2.0);
    }

    #[test]
    fn test_unknown_video_index_is_an_error() {
        let aligner = aligner(vec![("line", vec![clip(3, 0.0, 7, 1.0, vec![])])]);
        let err = aligner.align(&[], &videos(), &["line".to_string()]).unwrap_err();
        assert!(matches!(err, WorkerError::Model(ModelError::UnknownVideoIndex(7))));
    }
}
